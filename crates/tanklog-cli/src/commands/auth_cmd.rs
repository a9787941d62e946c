use tanklog_core::session::{restore_from_store, AuthState};
use tanklog_core::store::{TokenStore, REFRESH_TOKEN_KEY};
use tanklog_core::util::unix_timestamp_now;

use crate::cli::AuthCommands;
use crate::commands::common::Backend;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let backend = Backend::resolve(global_profile)?;

    match command {
        AuthCommands::Login { email, password } => {
            let session = backend
                .auth_client()?
                .login(&email, &password)
                .await?;
            println!(
                "Signed in profile '{}' as {}",
                backend.profile_name, session.user.email
            );
            Ok(())
        }
        AuthCommands::Register {
            email,
            password,
            user_name,
        } => {
            let session = backend
                .auth_client()?
                .register(&email, &password, &user_name)
                .await?;
            println!(
                "Registered {} and signed in profile '{}'",
                session.user.email, backend.profile_name
            );
            Ok(())
        }
        AuthCommands::Status => {
            let mut state = AuthState::new();
            let restored = restore_from_store(&backend.store, &mut state, unix_timestamp_now())?;
            if restored {
                let user = state
                    .user
                    .as_ref()
                    .map_or("(unknown)", |user| user.email.as_str());
                println!("Profile '{}' is signed in as {user}", backend.profile_name);
            } else {
                println!("Profile '{}' is not signed in.", backend.profile_name);
            }
            Ok(())
        }
        AuthCommands::Refresh => {
            let refresh_token = backend
                .store
                .load(REFRESH_TOKEN_KEY)?
                .ok_or(CliError::NotSignedIn)?;
            backend
                .auth_client()?
                .refresh(&refresh_token)
                .await?;
            println!("Access token refreshed for profile '{}'", backend.profile_name);
            Ok(())
        }
        AuthCommands::Logout => {
            backend
                .auth_client()?
                .logout()
                .await?;
            println!("Signed out profile '{}'", backend.profile_name);
            Ok(())
        }
        AuthCommands::ForgotPassword { email } => {
            let message = backend
                .auth_client()?
                .forgot_password(&email)
                .await?;
            println!("{message}");
            Ok(())
        }
        AuthCommands::VerifyOtp { email, otp } => {
            let message = backend
                .auth_client()?
                .verify_otp(&email, &otp)
                .await?;
            println!("{message}");
            Ok(())
        }
        AuthCommands::ResetPassword {
            email,
            otp,
            new_password,
        } => {
            let message = backend
                .auth_client()?
                .reset_password(&email, &otp, &new_password)
                .await?;
            println!("{message}");
            Ok(())
        }
    }
}
