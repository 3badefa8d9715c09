use clap::Subcommand;
use focusdeck_core::sync::keyring_store;

const TOKEN_KEY: &str = "api_token";

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the sync API bearer token in the OS keyring
    Login {
        /// Bearer token issued by the task backend
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Check whether a token is stored
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Login { token } => {
            keyring_store::set(TOKEN_KEY, &token)?;
            println!("token stored");
        }
        AuthAction::Logout => {
            keyring_store::delete(TOKEN_KEY)?;
            println!("token removed");
        }
        AuthAction::Status => {
            match keyring_store::get(TOKEN_KEY)? {
                Some(_) => println!("authenticated"),
                None => println!("not authenticated"),
            }
        }
    }
    Ok(())
}
