use std::path::Path;
use std::time::Instant;

use lockin_core::{evaluate, FixedClock, Schedule, Settings};

pub struct PerfBudgetOptions {
    pub settings_path: String,
    pub iterations: usize,
}

const BUDGET_DECODE_MS: f64 = 50.0;
const BUDGET_DECISION_P99_US: f64 = 1000.0;

pub fn run_perf_budget(opts: PerfBudgetOptions) -> Result<(), String> {
    println!("Performance Budget Check");
    println!("==================================================");

    let path = Path::new(&opts.settings_path);
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;

    println!("Decoding settings...");
    let decode_begin = Instant::now();
    let mut settings = Settings::from_json(&text).map_err(|e| e.to_string())?;
    let decode_ms = decode_begin.elapsed().as_secs_f64() * 1000.0;

    // Measure the full path: always inside the blocking window.
    settings.schedule = Schedule::all_day();
    let clock = FixedClock::parse("2024-01-01T12:00").map_err(|e| e.to_string())?;
    let urls = budget_urls(&settings);

    println!("Warming up...");
    for url in &urls {
        let _ = evaluate(url, &settings, &clock);
    }

    println!("Measuring decision latency over {} URLs...", urls.len());
    let latencies = measure_decision_latency(&settings, &clock, &urls, opts.iterations);
    let p99_us = percentile(&latencies, 0.99);

    let mut passed = true;
    println!();
    println!("Results");
    println!("--------------------------------------------------");

    passed &= report_budget("Settings Decode", decode_ms, BUDGET_DECODE_MS, "ms");
    passed &= report_budget("Decision P99 Latency", p99_us, BUDGET_DECISION_P99_US, "μs");

    println!();
    println!("==================================================");

    if passed {
        println!("✓ All performance budgets passed");
        Ok(())
    } else {
        Err("Performance budget exceeded".to_string())
    }
}

fn report_budget(name: &str, actual: f64, limit: f64, unit: &str) -> bool {
    let passed = actual <= limit;
    let status = if passed { "✓" } else { "✗" };
    println!(
        "{} {}: {:.2} {} (limit: {:.2} {})",
        status, name, actual, unit, limit, unit
    );
    passed
}

/// URLs exercising every configured site: root, each rule value, and an
/// unlisted host.
fn budget_urls(settings: &Settings) -> Vec<String> {
    let mut urls = vec![
        "https://unlisted.example/".to_string(),
        "invalid-url".to_string(),
    ];

    for site in &settings.blocked_sites {
        urls.push(format!("https://www.{}/", site.domain));
        for rule in &site.paths {
            let path = rule.value.replace('*', "x").replace('?', "y");
            let path = if path.starts_with('/') { path } else { format!("/{}", path) };
            urls.push(format!("https://{}{}", site.domain, path));
        }
    }

    urls
}

fn measure_decision_latency(
    settings: &Settings,
    clock: &FixedClock,
    urls: &[String],
    iterations: usize,
) -> Vec<f64> {
    let mut latencies = Vec::with_capacity(iterations * urls.len());

    for _ in 0..iterations {
        for url in urls {
            let start = Instant::now();
            let _ = evaluate(url, settings, clock);
            let elapsed = start.elapsed().as_secs_f64() * 1_000_000.0;
            latencies.push(elapsed);
        }
    }

    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    latencies
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}
