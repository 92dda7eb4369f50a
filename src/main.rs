use std::io::{self, Write};
use std::process::ExitCode;

use rustyreq::InputFilter;
use rustyreq::cgi;
use rustyreq::config::{CgiConfig, config, set_config};
use rustyreq::http::HttpRequest;
use rustyreq::http::status::HttpStatus;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_ENV: &str = "RUSTYREQ_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "rustyreq.toml";

fn main() -> ExitCode {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let loaded = CgiConfig::from_file(&path);
    let cfg = loaded.as_ref().ok().cloned().unwrap_or_default();

    // stdout carries the CGI response
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match loaded {
        Ok(_) => tracing::debug!(%path, "configuration loaded"),
        Err(err) => tracing::warn!(%path, %err, "falling back to default config"),
    }

    if set_config(cfg).is_err() {
        tracing::warn!("configuration was already installed");
    }

    let mut out = io::stdout().lock();
    let written = match cgi::from_process(InputFilter::shared()) {
        Ok(request) => write_report(&mut out, &request, config()),
        Err(err) => {
            tracing::error!(%err, "rejecting request");
            write_status(&mut out, err.into_http_status())
        }
    };

    match written.and_then(|()| out.flush()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "failed to write response");
            ExitCode::FAILURE
        }
    }
}

fn write_status(out: &mut impl Write, status: HttpStatus) -> io::Result<()> {
    write!(
        out,
        "{}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\n",
        status.cgi_line(),
        status.reason()
    )
}

/// Lists the reconstructed headers and the configured store's entries.
fn write_report(out: &mut impl Write, request: &HttpRequest, cfg: &CgiConfig) -> io::Result<()> {
    let store = match request.store(&cfg.source) {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(%err, source = %cfg.source, "configured source is not readable");
            return write_status(out, err.into_http_status());
        }
    };

    write!(
        out,
        "{}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n",
        HttpStatus::Ok.cgi_line()
    )?;

    writeln!(out, "[headers]")?;
    for (name, values) in request.headers().all() {
        if name == "authorization" {
            writeln!(out, "{name}: <redacted>")?;
        } else {
            writeln!(out, "{name}: {}", values.join(", "))?;
        }
    }

    if let Some(store) = store {
        writeln!(out, "\n[{}]", cfg.source)?;
        for key in store.keys() {
            writeln!(out, "{key} = {}", store.filter(key, &cfg.default_filter))?;
        }
    }

    Ok(())
}
