// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! nginx proxy configurator.
//!
//! Each subdomain gets `{config_dir}/{subdomain}.conf`. After every write or
//! removal the configuration is checked with `nginx -t` and applied with
//! `nginx -s reload`; if either fails the previous file is restored.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::fs;
use tokio::process::Command;
use tracing::{error, info, warn};

use super::traits::{ProxyConfigurator, ProxyError, Result};

/// nginx configurator settings.
#[derive(Debug, Clone)]
pub struct NginxConfig {
    /// Directory nginx includes site files from.
    pub config_dir: PathBuf,
    /// nginx executable.
    pub nginx_bin: String,
    /// Parent domain; rules match `<subdomain>.<domain>`.
    pub domain: String,
    /// Treat a missing nginx binary as a development host: write the file,
    /// skip validation and reload.
    pub optional: bool,
}

/// nginx-backed [`ProxyConfigurator`].
pub struct NginxProxy {
    config: NginxConfig,
}

const SECURITY_HEADERS: &str = r#"    # Security headers
    add_header X-Frame-Options "SAMEORIGIN" always;
    add_header X-Content-Type-Options "nosniff" always;
    add_header X-XSS-Protection "1; mode=block" always;
"#;

impl NginxProxy {
    /// Create a configurator.
    pub fn new(config: NginxConfig) -> Self {
        Self { config }
    }

    /// Path of the rule file for `subdomain`.
    pub fn config_path(&self, subdomain: &str) -> PathBuf {
        self.config.config_dir.join(format!("{}.conf", subdomain))
    }

    /// Rule serving `root` as a single-page app.
    pub fn render_static(&self, subdomain: &str, root: &Path) -> String {
        format!(
            r#"server {{
    listen 80;
    server_name {subdomain}.{domain};

    root {root};
    index index.html index.htm;

    location / {{
        try_files $uri $uri/ /index.html;
    }}

{headers}
    # Gzip compression
    gzip on;
    gzip_vary on;
    gzip_types text/plain text/css text/xml text/javascript application/x-javascript application/xml+rss application/json;

    # Cache static assets
    location ~* \.(jpg|jpeg|png|gif|ico|css|js|svg|woff|woff2|ttf|eot)$ {{
        expires 1y;
        add_header Cache-Control "public, immutable";
    }}
}}
"#,
            subdomain = subdomain,
            domain = self.config.domain,
            root = root.display(),
            headers = SECURITY_HEADERS,
        )
    }

    /// Rule forwarding to `localhost:port`, WebSocket upgrades included.
    pub fn render_proxy(&self, subdomain: &str, port: u16) -> String {
        format!(
            r#"server {{
    listen 80;
    server_name {subdomain}.{domain};

    location / {{
        proxy_pass http://localhost:{port};
        proxy_http_version 1.1;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection 'upgrade';
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_cache_bypass $http_upgrade;

        proxy_connect_timeout 60s;
        proxy_send_timeout 60s;
        proxy_read_timeout 60s;
    }}

{headers}}}
"#,
            subdomain = subdomain,
            domain = self.config.domain,
            port = port,
            headers = SECURITY_HEADERS,
        )
    }

    async fn nginx(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.config.nginx_bin)
            .args(args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ProxyError::BinaryNotFound(self.config.nginx_bin.clone())
                }
                _ => ProxyError::Io(e),
            })
    }

    async fn validate_and_reload(&self) -> Result<()> {
        let test = match self.nginx(&["-t"]).await {
            Ok(output) => output,
            Err(ProxyError::BinaryNotFound(bin)) if self.config.optional => {
                warn!(nginx_bin = %bin, "nginx not found, skipping reload");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if !test.status.success() {
            return Err(ProxyError::Validation(
                String::from_utf8_lossy(&test.stderr).trim().to_string(),
            ));
        }

        let reload = self.nginx(&["-s", "reload"]).await?;
        if !reload.status.success() {
            return Err(ProxyError::Reload(
                String::from_utf8_lossy(&reload.stderr).trim().to_string(),
            ));
        }

        info!("nginx reloaded successfully");
        Ok(())
    }

    /// Write (`Some`) or remove (`None`) the rule for `subdomain`, then
    /// validate and reload, restoring the previous file on failure.
    async fn apply(&self, subdomain: &str, content: Option<String>) -> Result<()> {
        let path = self.config_path(subdomain);
        let previous = match fs::read_to_string(&path).await {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        match &content {
            Some(text) => {
                fs::create_dir_all(&self.config.config_dir).await?;
                fs::write(&path, text).await?;
            }
            None if previous.is_none() => return Ok(()),
            None => fs::remove_file(&path).await?,
        }

        if let Err(e) = self.validate_and_reload().await {
            error!(subdomain = %subdomain, error = %e, "nginx rejected configuration, restoring previous rule");
            let restored = match &previous {
                Some(text) => fs::write(&path, text).await,
                None => fs::remove_file(&path).await,
            };
            if let Err(restore_err) = restored {
                error!(path = %path.display(), error = %restore_err, "Failed to restore nginx rule");
            }
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl ProxyConfigurator for NginxProxy {
    fn proxy_type(&self) -> &'static str {
        "nginx"
    }

    async fn publish_static(&self, subdomain: &str, root: &Path) -> Result<()> {
        self.apply(subdomain, Some(self.render_static(subdomain, root)))
            .await?;
        info!(subdomain = %subdomain, root = %root.display(), "Published static rule");
        Ok(())
    }

    async fn publish_proxy(&self, subdomain: &str, port: u16) -> Result<()> {
        self.apply(subdomain, Some(self.render_proxy(subdomain, port)))
            .await?;
        info!(subdomain = %subdomain, port = port, "Published proxy rule");
        Ok(())
    }

    async fn retract(&self, subdomain: &str) -> Result<()> {
        self.apply(subdomain, None).await?;
        info!(subdomain = %subdomain, "Retracted rule");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn proxy(dir: &Path, nginx_bin: &str, optional: bool) -> NginxProxy {
        NginxProxy::new(NginxConfig {
            config_dir: dir.join("sites-enabled"),
            nginx_bin: nginx_bin.to_string(),
            domain: "launch.me".to_string(),
            optional,
        })
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_render_static() {
        let temp = TempDir::new().unwrap();
        let text = proxy(temp.path(), "nginx", true)
            .render_static("blog", Path::new("/srv/projects/blog"));

        assert!(text.contains("server_name blog.launch.me;"));
        assert!(text.contains("root /srv/projects/blog;"));
        assert!(text.contains("try_files $uri $uri/ /index.html;"));
        assert!(text.contains("gzip on;"));
        assert!(text.contains("expires 1y;"));
        assert!(text.contains("X-Frame-Options \"SAMEORIGIN\""));
    }

    #[test]
    fn test_render_proxy() {
        let text = proxy(Path::new("/tmp"), "nginx", true).render_proxy("api", 12345);

        assert!(text.contains("server_name api.launch.me;"));
        assert!(text.contains("proxy_pass http://localhost:12345;"));
        assert!(text.contains("proxy_set_header Upgrade $http_upgrade;"));
        assert!(text.contains("proxy_read_timeout 60s;"));
        assert!(text.contains("X-Content-Type-Options \"nosniff\""));
        assert!(text.trim_end().ends_with('}'));
    }

    #[tokio::test]
    async fn test_missing_binary_in_optional_mode_still_writes_rule() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no-nginx").display().to_string();
        let proxy = proxy(temp.path(), &missing, true);

        proxy.publish_proxy("api", 10001).await.unwrap();
        assert!(proxy.config_path("api").exists());

        proxy.retract("api").await.unwrap();
        assert!(!proxy.config_path("api").exists());
    }

    #[tokio::test]
    async fn test_missing_binary_in_strict_mode_fails_and_rolls_back() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no-nginx").display().to_string();
        let proxy = proxy(temp.path(), &missing, false);

        let err = proxy.publish_proxy("api", 10001).await.unwrap_err();

        assert!(matches!(err, ProxyError::BinaryNotFound(_)));
        assert!(!proxy.config_path("api").exists());
    }

    #[tokio::test]
    async fn test_retract_missing_rule_is_success() {
        let temp = TempDir::new().unwrap();
        let proxy = proxy(temp.path(), "/nonexistent/nginx", false);
        proxy.retract("never-published").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_validation_failure_restores_previous_rule() {
        let temp = TempDir::new().unwrap();
        let ok_bin = script(temp.path(), "nginx-ok", "exit 0\n");
        let bad_bin = script(
            temp.path(),
            "nginx-bad",
            "if [ \"$1\" = \"-t\" ]; then echo 'emerg: unexpected }' >&2; exit 1; fi\nexit 0\n",
        );

        let good = proxy(temp.path(), &ok_bin, false);
        good.publish_proxy("api", 10001).await.unwrap();
        let before = std::fs::read_to_string(good.config_path("api")).unwrap();

        let bad = proxy(temp.path(), &bad_bin, false);
        let err = bad.publish_proxy("api", 10002).await.unwrap_err();
        assert!(matches!(err, ProxyError::Validation(ref msg) if msg.contains("emerg")));
        assert_eq!(std::fs::read_to_string(bad.config_path("api")).unwrap(), before);

        let err = bad.publish_static("fresh", temp.path()).await.unwrap_err();
        assert!(matches!(err, ProxyError::Validation(_)));
        assert!(!bad.config_path("fresh").exists());

        let err = bad.retract("api").await.unwrap_err();
        assert!(matches!(err, ProxyError::Validation(_)));
        assert!(bad.config_path("api").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reload_sequence() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("nginx.log");
        let bin = script(
            temp.path(),
            "nginx-log",
            &format!("echo \"$@\" >> \"{}\"\nexit 0\n", log.display()),
        );

        proxy(temp.path(), &bin, false)
            .publish_static("blog", temp.path())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(log).unwrap(), "-t\n-s reload\n");
    }
}
