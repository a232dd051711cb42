use credgate::client::{AuthForm, Field, HttpAuthApi, Mode, DEFAULT_BASE_URL};
use dialoguer::{Input, Password, Select};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let base_url = std::env::var("AUTH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let api = HttpAuthApi::new(base_url);
    let mut form = AuthForm::new();

    loop {
        let switch = match form.mode() {
            Mode::Signup => "Already have an account? Login",
            Mode::Login => "New here? Sign Up",
        };
        let choice = Select::new()
            .with_prompt(format!("\n{}", form.mode()))
            .items(&["Fill in and submit", switch, "Quit"])
            .default(0)
            .interact()?;

        match choice {
            0 => {
                fill(&mut form)?;
                match form.submit(&api).await {
                    Some(res) => println!("{}", res.message),
                    None => {
                        if let Some(err) = form.error() {
                            eprintln!("{err}");
                        }
                    }
                }
            }
            1 => form.toggle(),
            _ => return Ok(()),
        }
    }
}

/// Prompts for every field the current mode shows, keeping prior values as defaults.
fn fill(form: &mut AuthForm) -> anyhow::Result<()> {
    for &field in form.mode().fields() {
        let value = match field {
            Field::Password => Password::new().with_prompt("Password").interact()?,
            Field::Username | Field::Email => {
                let label = if field == Field::Username { "Username" } else { "Email" };
                Input::<String>::new()
                    .with_prompt(label)
                    .with_initial_text(form.credentials().get(field))
                    .allow_empty(true)
                    .interact_text()?
            }
        };
        form.edit(field, value);
    }
    Ok(())
}
