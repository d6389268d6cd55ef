use moodle_console::guard::Route;

use super::{CommandError, Console};

pub async fn login(console: &Console, email: &str, password: &str) -> Result<(), CommandError> {
    let profile = console.auth.sign_in(email, password).await?;
    println!("Signed in as {} <{}>", profile.display_name(), profile.email);
    Ok(())
}

pub async fn logout(console: &Console) -> Result<(), CommandError> {
    console.auth.logout().await?;
    println!("Signed out");
    Ok(())
}

pub async fn whoami(console: &Console) -> Result<(), CommandError> {
    console.enter(Route::Instances)?;
    let profile = match console.session.profile() {
        Some(profile) => profile,
        None => {
            let profile = console.auth.current_user().await?;
            console.session.set_profile(profile.clone()).await?;
            profile
        }
    };
    println!("{} <{}>", profile.display_name(), profile.email);
    if profile.is_superuser {
        println!("superuser");
    }
    Ok(())
}
