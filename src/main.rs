#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use yansi::Paint;

use crate::application::cli;
use crate::application::session_loop::SessionLoop;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::gpu::NvidiaSmi;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! Autoforge has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    let debug_log_dir = env::var("AUTOFORGE_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap()
            .join("autoforge")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("autoforge")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let ready_res = cli::parse().await;
    if let Err(ready_err) = ready_res {
        handle_error(ready_err);
        return;
    }
    if !ready_res.unwrap() {
        process::exit(0);
    }

    let backend = match BackendManager::get() {
        Ok(backend) => backend,
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    let mut session = SessionLoop::new(backend, Box::<NvidiaSmi>::default());

    // Ctrl-C during a long install or generation lands here; supervised
    // children are stopped in shutdown either way.
    let res = tokio::select!(
        res = session.run() => res,
        _ = tokio::signal::ctrl_c() => Ok(()),
    );

    session.shutdown().await;

    if let Err(err) = res {
        handle_error(err);
    }

    process::exit(0);
}
