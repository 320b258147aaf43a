//! Rendering of the systemd unit and the nginx site

use crate::app::options::DeployOptions;

/// Alternatives link the unit launches the runtime through
pub const JAVA_LINK: &str = "/usr/bin/java";
pub const JAVAC_LINK: &str = "/usr/bin/javac";

/// Render the systemd unit for the application
pub fn render_unit(options: &DeployOptions) -> String {
    let spec = &options.spec;
    let install_dir = spec.install_dir();
    let user = spec.service_user();

    format!(
        "[Unit]
Description={name} Spring Boot Application
After=network.target

[Service]
Type=simple
User={user}
Group={user}
WorkingDirectory={install_dir}
ExecStart={java} -jar -Dspring.profiles.active={profile} -Dserver.port={port} {artifact}
Restart=always
RestartSec={restart}
StandardOutput=journal
StandardError=journal
SyslogIdentifier={name}

# Environment variables
Environment=JAVA_HOME={java_home}
Environment=SPRING_PROFILES_ACTIVE={profile}

# Security settings
NoNewPrivileges=true
PrivateTmp=true
ProtectSystem=strict
ReadWritePaths={logs_dir}

[Install]
WantedBy=multi-user.target
",
        name = spec.app_name(),
        user = user,
        install_dir = install_dir.display(),
        java = JAVA_LINK,
        profile = spec.profile(),
        port = spec.port(),
        artifact = spec.deployed_artifact().display(),
        restart = options.lifecycle.restart_delay.as_secs(),
        java_home = options.runtime.java_home.display(),
        logs_dir = spec.logs_dir().display(),
    )
}

/// Render the nginx server block proxying to the application
pub fn render_site(options: &DeployOptions) -> String {
    let spec = &options.spec;
    let layout = &options.layout;
    let proxy = &options.proxy;
    let upstream = format!("http://localhost:{}", spec.port());

    format!(
        "server {{
    listen {listen};
    server_name {server_name};

    access_log {access_log};
    error_log {error_log};

    location / {{
        proxy_pass {upstream};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;

        # Timeouts
        proxy_connect_timeout {timeout}s;
        proxy_send_timeout {timeout}s;
        proxy_read_timeout {timeout}s;
    }}

    # Health check endpoint
    location {health} {{
        proxy_pass {upstream}{health};
        access_log off;
    }}
}}
",
        listen = proxy.listen_port,
        server_name = proxy.server_name,
        access_log = layout.access_log(spec.app_name()).display(),
        error_log = layout.error_log(spec.app_name()).display(),
        upstream = upstream,
        timeout = proxy.timeout_secs,
        health = options.health.path,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deployment::DeploymentSpec;
    use crate::storage::settings::Settings;

    fn options(name: &str, port: u16, profile: &str) -> DeployOptions {
        let spec = DeploymentSpec::new(name, format!("/build/{}.jar", name))
            .unwrap()
            .with_port(port)
            .unwrap()
            .with_profile(profile)
            .unwrap();
        DeployOptions::new(spec, &Settings::default())
    }

    #[test]
    fn test_unit_paths_follow_spec() {
        for (name, port, profile) in [("orders", 9090, "staging"), ("billing", 8080, "prod")] {
            let unit = render_unit(&options(name, port, profile));

            assert!(unit.contains(&format!("WorkingDirectory=/opt/{}\n", name)));
            assert!(unit.contains(&format!(
                "ExecStart=/usr/bin/java -jar -Dspring.profiles.active={profile} -Dserver.port={port} /opt/{name}/{name}.jar\n"
            )));
            assert!(unit.contains(&format!("Environment=SPRING_PROFILES_ACTIVE={}\n", profile)));
            assert!(unit.contains(&format!("ReadWritePaths=/opt/{}/logs\n", name)));
        }
    }

    #[test]
    fn test_unit_restart_policy() {
        let unit = render_unit(&options("orders", 9090, "staging"));
        assert!(unit.contains("Restart=always\nRestartSec=10\n"));
        assert!(unit.contains("User=springboot\nGroup=springboot\n"));
        assert!(unit.contains("NoNewPrivileges=true"));
        assert!(unit.contains("ProtectSystem=strict"));
        assert!(unit.contains("WantedBy=multi-user.target"));
    }

    #[test]
    fn test_site_forwards_to_app_port() {
        let site = render_site(&options("orders", 9090, "staging"));

        assert!(site.contains("listen 80;"));
        assert!(site.contains("proxy_pass http://localhost:9090;"));
        assert!(site.contains("proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;"));
        assert!(site.contains("proxy_read_timeout 60s;"));
        assert!(site.contains("access_log /var/log/nginx/orders.access.log;"));
    }

    #[test]
    fn test_site_health_location_suppresses_access_log() {
        let site = render_site(&options("orders", 9090, "staging"));

        let location = site
            .split("location /actuator/health {")
            .nth(1)
            .and_then(|rest| rest.split('}').next())
            .expect("health location present");
        assert!(location.contains("proxy_pass http://localhost:9090/actuator/health;"));
        assert!(location.contains("access_log off;"));
    }
}
