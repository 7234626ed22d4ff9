// Copyright 2024 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, Method};
use rustfs_s3client::{Error, S3Client};
use tokio::io::{AsyncWriteExt, stdout};
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli)?;

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            print_usage_help();
            std::process::exit(2);
        }
    };

    let client = match S3Client::new(config) {
        Ok(client) => client,
        Err(e @ Error::Config { .. }) => {
            error!("Configuration validation failed: {}", e);
            print_usage_help();
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Failed to create S3 client"),
    };
    cli.log_configuration(client.config());

    if let Err(e) = run(&client, cli.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(client: &S3Client, command: Command) -> Result<()> {
    match command {
        Command::Mb { bucket } => {
            client.create_bucket(&bucket).await.context("Failed to create bucket")?;
            info!("Bucket {} created", bucket);
        }
        Command::Rb { bucket, force } => {
            if force {
                client.empty_bucket(&bucket).await.context("Failed to empty bucket")?;
            }
            client.delete_bucket(&bucket).await.context("Failed to delete bucket")?;
            info!("Bucket {} deleted", bucket);
        }
        Command::Buckets => {
            for name in client.list_buckets().await.context("Failed to list buckets")? {
                println!("{name}");
            }
        }
        Command::BucketExists { bucket } => {
            let exists = client.bucket_exists(&bucket).await.context("Failed to check bucket")?;
            println!("{exists}");
        }
        Command::WaitBucket { bucket, timeout } => {
            client
                .wait_bucket_exists(&bucket, timeout)
                .await
                .context("Bucket did not become available")?;
            info!("Bucket {} exists", bucket);
        }
        Command::Ls { bucket, prefix } => {
            for key in client.list_objects(&bucket, &prefix).await.context("Failed to list objects")? {
                println!("{key}");
            }
        }
        Command::Put { local_path, bucket, key } => {
            let key = match key {
                Some(key) => key,
                None => local_path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(String::from)
                    .context("Cannot derive an object key from the local path, pass one explicitly")?,
            };
            client
                .upload_file(&bucket, &key, &local_path)
                .await
                .with_context(|| format!("Failed to upload {}", local_path.display()))?;
            info!("Uploaded {} to {}/{}", local_path.display(), bucket, key);
        }
        Command::Get { bucket, key, local_path } => {
            client
                .download_file(&bucket, &key, &local_path)
                .await
                .with_context(|| format!("Failed to download {bucket}/{key}"))?;
            info!("Downloaded {}/{} to {}", bucket, key, local_path.display());
        }
        Command::Cat { bucket, key } => {
            let body = client.get_object(&bucket, &key).await.context("Failed to get object")?;
            let mut reader = body.into_async_read();
            let mut out = stdout();
            tokio::io::copy(&mut reader, &mut out).await.context("Failed to read object")?;
            out.flush().await?;
        }
        Command::Rm { bucket, key } => {
            client.delete_object(&bucket, &key).await.context("Failed to delete object")?;
        }
        Command::RmMany { bucket, keys } => {
            client.delete_objects(&bucket, &keys).await.context("Failed to delete objects")?;
            info!("Deleted {} objects from {}", keys.len(), bucket);
        }
        Command::Exists { bucket, key } => {
            let exists = client.object_exists(&bucket, &key).await.context("Failed to check object")?;
            println!("{exists}");
        }
        Command::Empty { bucket } => {
            client.empty_bucket(&bucket).await.context("Failed to empty bucket")?;
        }
        Command::Cp {
            src_bucket,
            src_key,
            dst_bucket,
            dst_key,
        } => {
            client
                .copy_object(&src_bucket, &src_key, &dst_bucket, &dst_key)
                .await
                .context("Failed to copy object")?;
        }
        Command::Mv { bucket, src_key, dst_key } => {
            client
                .move_object(&bucket, &src_key, &dst_key)
                .await
                .context("Failed to move object")?;
        }
        Command::Presign {
            method,
            bucket,
            key,
            expires,
        } => {
            let url = match method {
                Method::Get => client.presign_get_object(&bucket, &key, expires).await,
                Method::Put => client.presign_put_object(&bucket, &key, expires).await,
            }
            .context("Failed to presign request")?;
            println!("{url}");
        }
    }
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Failed to create log filter")?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries command output
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set global tracing subscriber")?;

    Ok(())
}

fn print_usage_help() {
    eprintln!();
    eprintln!("For more help, run: rustfs-s3client --help");
    eprintln!();
    eprintln!("QUICK START:");
    eprintln!("  export AWS_ENDPOINT_URL=http://localhost:9000");
    eprintln!("  export AWS_ACCESS_KEY_ID=YOUR_KEY");
    eprintln!("  export AWS_SECRET_ACCESS_KEY=YOUR_SECRET");
    eprintln!("  rustfs-s3client buckets");
    eprintln!();
}
