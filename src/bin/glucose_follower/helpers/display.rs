// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Output formatting helpers for glucose-follower
// ABOUTME: Prints stored settings with obscured secrets and delivered reading series

use chrono::{DateTime, Utc};
use glucose_follower::models::ChronoSequence;
use glucose_follower::settings::FollowerSettings;
use glucose_follower::utils::obscure_secret;

/// Print stored settings; password and token are obscured
pub fn display_settings(settings: &FollowerSettings, history_slots: usize) {
    println!("\nGlucose follower settings");
    println!("{}", "=".repeat(60));
    println!("   Server: {}", settings.base_url);
    println!(
        "   Username: {}",
        settings.username.as_deref().unwrap_or("(not set)")
    );
    println!(
        "   Password: {}",
        settings
            .password
            .as_deref()
            .map_or_else(|| "(not set)".to_owned(), obscure_secret)
    );
    println!(
        "   Auth token: {}",
        settings
            .session
            .auth_token
            .as_deref()
            .map_or_else(|| "(none)".to_owned(), obscure_secret)
    );
    println!(
        "   Patient: {}",
        settings.session.patient_id.as_deref().unwrap_or("(unresolved)")
    );
    println!("   Follower enabled: {}", yes_no(settings.follower_enabled));
    println!("   Smoothing enabled: {}", yes_no(settings.smoothing_enabled));
    println!("   Rolling history: {history_slots} slots");
    println!("{}", "=".repeat(60));
}

/// Print a delivered series, newest first
pub fn display_readings(
    readings: &ChronoSequence,
    serial_number: Option<&str>,
    sensor_start: Option<DateTime<Utc>>,
) {
    println!("\nReadings received: {}", readings.len());
    if let Some(serial) = serial_number {
        println!("   Sensor: {serial}");
    }
    if let Some(start) = sensor_start {
        println!("   Sensor started: {}", start.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("{}", "-".repeat(40));

    for reading in readings {
        let time = reading.timestamp.format("%Y-%m-%d %H:%M");
        if reading.is_placeholder() {
            println!("   {time}      --");
        } else {
            println!("   {time}  {:>6.1} mg/dL", reading.raw_value);
        }
    }
}

/// Print the result of a credential check
pub fn display_message(title: &str, message: &str) {
    println!("\n{title}");
    println!("{}", "=".repeat(title.len()));
    println!("{message}");
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
