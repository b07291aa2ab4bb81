use crate::auth::provider::{Authorizer, TokenExchanger};
use crate::auth::token::Credential;
use crate::utils::errors::{AuthError, AuthResult};
use crate::utils::random::{AlphanumericState, StateGenerator};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;

type SharedInput = Arc<Mutex<Box<dyn BufRead + Send>>>;
type SharedOutput = Arc<Mutex<Box<dyn Write + Send>>>;

/// Prints the authorization URL and reads the code the user pastes back.
pub struct TerminalAuthorizer {
    exchanger: Arc<dyn TokenExchanger>,
    state: Arc<dyn StateGenerator>,
    input: SharedInput,
    output: SharedOutput,
}

impl TerminalAuthorizer {
    /// Uses the process's standard input and output.
    pub fn new(exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self::with_io(
            exchanger,
            Box::new(std::io::BufReader::new(std::io::stdin())),
            Box::new(std::io::stdout()),
        )
    }

    pub fn with_io(
        exchanger: Arc<dyn TokenExchanger>,
        input: Box<dyn BufRead + Send>,
        output: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            exchanger,
            state: Arc::new(AlphanumericState::default()),
            input: Arc::new(Mutex::new(input)),
            output: Arc::new(Mutex::new(output)),
        }
    }

    fn prompt(&self, auth_url: &str) -> AuthResult<()> {
        let mut out = self.output.lock();
        write!(
            out,
            "Go to the following link in your browser:\n{}\n\nEnter authorization code: ",
            auth_url
        )?;
        out.flush()?;
        Ok(())
    }

    async fn read_code(&self) -> AuthResult<String> {
        let input = Arc::clone(&self.input);
        let line = tokio::task::spawn_blocking(move || {
            let mut line = String::new();
            let read = input.lock().read_line(&mut line)?;
            if read == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "input closed before a code was entered",
                ));
            }
            Ok(line)
        })
        .await
        .map_err(|e| AuthError::Stdin(e.to_string()))?
        .map_err(|e| AuthError::Stdin(e.to_string()))?;

        let code = line.trim().to_string();
        if code.is_empty() {
            return Err(AuthError::Stdin("empty authorization code".to_string()));
        }
        Ok(code)
    }
}

#[async_trait]
impl Authorizer for TerminalAuthorizer {
    async fn authorize(&self) -> AuthResult<Credential> {
        let auth_url = self.exchanger.authorize_url(&self.state.generate());
        self.prompt(&auth_url)?;

        let code = self.read_code().await?;
        let credential = self.exchanger.exchange_code(&code).await?;
        info!("Terminal authorization complete");
        Ok(credential)
    }
}
