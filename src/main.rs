use log::{error, info};
use providers::VoiceRouter;
use serde::Serialize;
use serde_json::json;
use service::config::{Command, Config};
use service::logging::Logger;
use transcription::types::AudioInput;
use transcription::Error;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    let router = match VoiceRouter::new(config.voice_router_config()) {
        Ok(router) => router,
        Err(e) => {
            error!("Failed to configure transcription providers: {e}");
            std::process::exit(1);
        }
    };
    info!("Registered providers: {:?}", router.registered_providers());

    match run(&router, config.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

/// Runs one command and prints its result. Returns whether the provider call succeeded.
async fn run(router: &VoiceRouter, command: Command) -> Result<bool, Error> {
    match command {
        Command::Transcribe(args) => {
            let options = args.options();
            let audio = AudioInput::url(args.url);
            let response = match args.provider {
                Some(provider) => {
                    router
                        .transcribe_with_provider(provider, audio, &options)
                        .await?
                }
                None => router.transcribe(audio, &options).await?,
            };
            print_json(&response)?;
            Ok(response.is_success())
        }
        Command::Get { provider, id } => {
            let response = router.get_transcript(&id, provider).await?;
            print_json(&response)?;
            Ok(response.is_success())
        }
        Command::Delete { provider, id } => {
            let response = router.delete_transcript(&id, provider).await?;
            print_json(&response)?;
            Ok(response.is_success())
        }
        Command::List { provider, limit } => {
            let response = router.list_transcripts(provider, limit).await?;
            print_json(&response)?;
            Ok(response.is_success())
        }
        Command::Capabilities => {
            let capabilities: Vec<_> = router
                .registered_providers()
                .into_iter()
                .map(|provider| {
                    json!({
                        "provider": provider,
                        "default": router.default_provider() == Some(provider),
                        "capabilities": router.provider_capabilities(provider),
                    })
                })
                .collect();
            print_json(&capabilities)?;
            Ok(true)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
