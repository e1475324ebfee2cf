//! chat_probe - send one greeting to a chat-completion API and print the reply
//!
//! Reads `OPENAI_API_KEY` (required), `OPENAI_BASE_URL` and `OPENAI_MODEL`,
//! after loading a `.env` file if one is found.

use anyhow::Result;
use clap::Parser;

use pitch_detector::chat::{self, ChatSettings, GREETING};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Message to send instead of the default greeting.
    #[arg(long, default_value = GREETING)]
    message: String,
    /// Model name.
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    chat::load_dotenv();

    let args = Args::parse();
    let mut settings = ChatSettings::from_env()?;
    if let Some(model) = args.model {
        settings.model = model;
    }

    let reply = chat::complete(&settings, &args.message)?;
    println!("{}", reply);
    Ok(())
}
