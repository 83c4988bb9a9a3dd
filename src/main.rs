use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vault_aws_credential_protocol::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the credential JSON, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_target(false)
        .init();

    match cli.run().await {
        Ok(output) => {
            if let Some(output) = output {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout
                    .write_all(output.as_bytes())
                    .and_then(|_| stdout.flush())
                {
                    eprintln!("Error: writing to stdout: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
