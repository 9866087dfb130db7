//! Config subcommand handlers.

use std::io::BufRead as _;
use std::path::PathBuf;

use secrecy::SecretString;

use smartpole_config::{ConfigFile, FileStore};
use smartpole_core::{ConnectionSettings, Dashboard, TlsVerification};

use crate::cli::{ConfigArgs, ConfigCommand, ConnectionArgs, GlobalOpts, PasswordArgs, SetArgs};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the password.
fn format_config_redacted(cfg: &ConfigFile, path: &str) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let conn = &cfg.connection;

    let _ = writeln!(out, "# {path}");
    let _ = writeln!(out, "[connection]");
    let _ = writeln!(out, "endpoint = \"{}\"", conn.endpoint);
    let _ = writeln!(out, "username = \"{}\"", conn.username);
    let _ = writeln!(out, "password = \"{}\"", conn.password);
    let _ = writeln!(out, "timeout_secs = {}", conn.timeout_secs);
    let _ = writeln!(out, "insecure = {}", conn.insecure);
    if let Some(ref ca) = conn.ca_cert {
        let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
    }

    for asset in &cfg.assets {
        let enabled = asset.devices.iter().filter(|d| d.enabled).count();
        let _ = writeln!(out);
        let _ = write!(
            out,
            "# asset {} \"{}\": enabled={}, {}/{} devices enabled",
            asset.id,
            asset.name,
            asset.enabled,
            enabled,
            asset.devices.len()
        );
        if asset.orphaned {
            out.push_str(", orphaned");
        }
    }
    out
}

fn redact(mut cfg: ConfigFile) -> ConfigFile {
    if !cfg.connection.password.is_empty() {
        cfg.connection.password = "****".into();
    }
    cfg
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "password".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Password from stdin (first line) or an interactive prompt.
fn read_password(args: &PasswordArgs) -> Result<SecretString, CliError> {
    let password = if args.password_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password("Console password: ").map_err(prompt_err)?
    };

    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

/// Apply `--insecure` / `--ca-cert` on top of the current TLS policy.
fn apply_tls(
    current: TlsVerification,
    insecure: Option<bool>,
    ca_cert: Option<PathBuf>,
) -> TlsVerification {
    match (insecure, ca_cert) {
        (Some(true), _) => TlsVerification::DangerAcceptInvalid,
        (_, Some(path)) => TlsVerification::CustomCa(path),
        (Some(false), None) => match current {
            TlsVerification::DangerAcceptInvalid => TlsVerification::SystemDefaults,
            other => other,
        },
        (None, None) => current,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// Print the configuration without touching the cipher key.
pub fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let store = FileStore::resolve(global.config.clone());
    let cfg = redact(store.load()?);
    let path = store.path().display().to_string();
    let out = output::render_single(global.output, &cfg, |c| format_config_redacted(c, &path))?;
    output::print_output(&out);
    Ok(())
}

pub fn handle(args: ConfigArgs, dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => show(global),
        ConfigCommand::Init(args) => init(dashboard, args, global),
        ConfigCommand::SetPassword(args) => {
            let password = read_password(&args)?;
            let current = dashboard.config()?.connection;
            dashboard.update_connection(current, Some(&password))?;
            eprintln!("Password updated");
            Ok(())
        }
        ConfigCommand::Set(args) => set(dashboard, args),
    }
}

fn init(dashboard: &Dashboard, args: ConnectionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let password = read_password(&args.password)?;
    let settings = ConnectionSettings {
        endpoint: args.endpoint,
        username: args.username,
        password: String::new(),
        timeout_secs: args.timeout,
        tls: apply_tls(TlsVerification::SystemDefaults, Some(args.insecure), args.ca_cert),
    };
    dashboard.update_connection(settings, Some(&password))?;

    let store = FileStore::resolve(global.config.clone());
    eprintln!("Configuration saved to {}", store.path().display());
    eprintln!("Verify with: smartpole test-connection");
    Ok(())
}

fn set(dashboard: &Dashboard, args: SetArgs) -> Result<(), CliError> {
    let SetArgs {
        endpoint,
        username,
        timeout,
        insecure,
        ca_cert,
    } = args;
    if endpoint.is_none()
        && username.is_none()
        && timeout.is_none()
        && insecure.is_none()
        && ca_cert.is_none()
    {
        return Err(CliError::Validation {
            field: "arguments".into(),
            reason: "nothing to change; pass at least one setting".into(),
        });
    }

    let mut settings = dashboard.config()?.connection;
    if let Some(endpoint) = endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(username) = username {
        settings.username = username;
    }
    if let Some(timeout) = timeout {
        settings.timeout_secs = timeout;
    }
    settings.tls = apply_tls(settings.tls, insecure, ca_cert);

    dashboard.update_connection(settings, None)?;
    eprintln!("Connection settings updated");
    Ok(())
}
