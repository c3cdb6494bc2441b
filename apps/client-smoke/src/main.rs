use std::env;

use client_core::{Either, RequestExecutor, WorkoutRepository};
use client_http::{HttpClientConfig, WorkoutsClient};
use futures::StreamExt;
use tokio::runtime::Handle;
use url::Url;

#[tokio::main]
async fn main() {
    let base_url = env::var("WORKOUTS_BASE_URL")
        .unwrap_or_else(|_| "https://workouts.example.org/".to_owned());
    let base_url = match Url::parse(&base_url) {
        Ok(url) => url,
        Err(err) => {
            eprintln!("Invalid WORKOUTS_BASE_URL '{base_url}': {err}");
            std::process::exit(1);
        }
    };

    let executor = RequestExecutor::new(Handle::current());
    let client = match WorkoutsClient::new(&HttpClientConfig::new(base_url), executor) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Failed to build client: {err}");
            std::process::exit(1);
        }
    };

    match client.workouts.get_workouts_list().next().await {
        Some(Either::Success(workouts)) => {
            println!("Fetched {} workouts.", workouts.len());
        }
        Some(Either::Failure(err)) => {
            eprintln!("Workout list request failed: {err}");
            std::process::exit(1);
        }
        None => {
            eprintln!("Workout list request produced no result");
            std::process::exit(1);
        }
    }
}
