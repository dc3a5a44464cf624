/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use ride_hailing_client::{
    common::types::{Notice, NoticeSeverity},
    environment::{AppConfig, AppState},
    tools::{error::AppError, logger::*},
};
use std::{
    env::var,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::mpsc,
};

pub fn read_dhall_config(config_path: &str) -> Result<AppConfig, String> {
    let config = serde_dhall::from_file(config_path).parse::<AppConfig>();
    match config {
        Ok(config) => Ok(config),
        Err(e) => Err(format!("Error reading config: {}", e)),
    }
}

async fn run_notice_banner(mut notices: mpsc::Receiver<Notice>) {
    while let Some(notice) = notices.recv().await {
        match notice.severity {
            NoticeSeverity::Info => info!(tag = "[NOTICE]", "{}", notice.message),
            NoticeSeverity::Warning => warn!(tag = "[NOTICE]", "{}", notice.message),
            NoticeSeverity::Error => error!(tag = "[NOTICE]", "{}", notice.message),
        }
    }
}

async fn start_client() -> Result<(), AppError> {
    let dhall_config_path = var("DHALL_CONFIG")
        .unwrap_or_else(|_| "./dhall_config/ride_hailing_client.dhall".to_string());
    let app_config = read_dhall_config(&dhall_config_path).unwrap_or_else(|err| {
        println!("Dhall Config Reading Error : {}", err);
        std::process::exit(1);
    });

    let _guard = setup_tracing(app_config.logger_cfg);

    let (notice_sender, notice_receiver) = mpsc::channel(app_config.notice_buffer_size);
    tokio::spawn(run_notice_banner(notice_receiver));

    let app_state = AppState::new(app_config, notice_sender).await?;

    let graceful_termination_requested = Arc::new(AtomicBool::new(false));
    let graceful_termination_requested_sigterm = graceful_termination_requested.to_owned();
    let graceful_termination_requested_sigint = graceful_termination_requested.to_owned();
    // Listen for SIGTERM signal.
    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to initialize SIGTERM handler");
        sigterm.recv().await;
        graceful_termination_requested_sigterm.store(true, Ordering::Relaxed);
    });
    // Listen for SIGINT (Ctrl+C) signal.
    tokio::spawn(async move {
        let mut sigint =
            signal(SignalKind::interrupt()).expect("Failed to initialize SIGINT handler");
        sigint.recv().await;
        graceful_termination_requested_sigint.store(true, Ordering::Relaxed);
    });

    let Some(session) = app_state.sessions.load_session().await? else {
        info!(tag = "[NO SESSION]", "Sign in before starting the client");
        return Ok(());
    };

    info!(
        tag = "[SESSION RESTORED]",
        user = %session.user.name,
        role = %session.role
    );

    let controller = app_state.controller(session);
    match controller.run_until(graceful_termination_requested).await {
        Ok(()) => Ok(()),
        Err(AppError::Unauthorized) => {
            // An expired token sends the user back through sign-in.
            warn!(tag = "[SESSION EXPIRED]");
            app_state.sessions.clear_session().await
        }
        Err(err) => Err(err),
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = start_client().await {
        println!("Ride hailing client failed to start : {}", err);
        std::process::exit(1);
    }
}
