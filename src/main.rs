use seedmerit::{app, bootstrap};

#[tokio::main]
async fn main() {
    let (config, tracker) = bootstrap::app::setup();

    let jobs = app::start(&config, tracker).await;

    // The jobs finish after ctrl-c.
    for job in jobs {
        let _ = job.await;
    }
}
