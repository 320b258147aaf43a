//! Provisioning pipeline
//!
//! Each step is plain data: an ordered list of [`CommandSpec`]s. Nothing
//! here touches the host, so the whole pipeline can be inspected, printed
//! and tested without a shell.

use std::path::Path;

use serde::Serialize;

use crate::app::options::DeployOptions;
use crate::deploy::render::{render_site, render_unit, JAVAC_LINK, JAVA_LINK};
use crate::models::command::{CommandSpec, ConflictRule};

/// One named unit of provisioning
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub name: &'static str,
    pub commands: Vec<CommandSpec>,

    /// Undo commands run when a validator in `commands` rejects the change
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rollback: Vec<CommandSpec>,
}

impl Step {
    fn new(name: &'static str, commands: Vec<CommandSpec>) -> Self {
        Self {
            name,
            commands,
            rollback: Vec::new(),
        }
    }

    fn on_rejected(mut self, rollback: Vec<CommandSpec>) -> Self {
        self.rollback = rollback;
        self
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Write `contents` into the private staging dir on the host, then move it to `target`
fn stage_and_move(
    options: &DeployOptions,
    name: &str,
    contents: String,
    target: &Path,
) -> Vec<CommandSpec> {
    let staging = options.layout.staging_file(name);

    vec![
        CommandSpec::new("mkdir")
            .args(["-p", "-m", "0700"])
            .arg(path_arg(&options.layout.staging_dir)),
        CommandSpec::new("dd")
            .arg(format!("of={}", staging.display()))
            .arg("status=none")
            .stdin(contents),
        CommandSpec::new("mv").arg(path_arg(&staging)).arg(path_arg(target)),
    ]
}

/// Step 1: install the JDK and register it as the default alternative
pub fn install_runtime(options: &DeployOptions) -> Step {
    let runtime = &options.runtime;
    let priority = runtime.alternatives_priority.to_string();

    Step::new(
        "install runtime",
        vec![
            CommandSpec::new("apt-get").arg("update"),
            CommandSpec::new("apt-get").args(["install", "-y", runtime.package.as_str()]),
            CommandSpec::new("update-alternatives")
                .args(["--install", JAVA_LINK, "java"])
                .arg(path_arg(&runtime.java_bin()))
                .arg(priority.as_str()),
            CommandSpec::new("update-alternatives")
                .args(["--install", JAVAC_LINK, "javac"])
                .arg(path_arg(&runtime.javac_bin()))
                .arg(priority.as_str()),
            CommandSpec::new("java").arg("-version"),
        ],
    )
}

/// Step 2: create the login-disabled service account
pub fn create_account(options: &DeployOptions) -> Step {
    let user = options.spec.service_user();
    let conflict = ConflictRule::new().stderr_contains(format!("user '{}' already exists", user));

    Step::new(
        "create service account",
        vec![CommandSpec::new("useradd")
            .args(["-r", "-s", "/bin/false", user])
            .tolerate(conflict)],
    )
}

/// Step 3: create the installation tree and hand it to the service account
pub fn prepare_directories(options: &DeployOptions) -> Step {
    let spec = &options.spec;

    Step::new(
        "prepare directories",
        vec![
            CommandSpec::new("mkdir").arg("-p").arg(path_arg(&spec.install_dir())),
            CommandSpec::new("mkdir").arg("-p").arg(path_arg(&spec.logs_dir())),
            CommandSpec::new("mkdir").arg("-p").arg(path_arg(&spec.config_dir())),
            CommandSpec::new("chown")
                .args(["-R", spec.owner().as_str()])
                .arg(path_arg(&spec.install_dir())),
        ],
    )
}

/// Step 4: copy the artifact into place
///
/// The caller must have verified that the artifact exists.
pub fn deploy_artifact(options: &DeployOptions) -> Step {
    let spec = &options.spec;
    let destination = path_arg(&spec.deployed_artifact());
    let mut commands = Vec::new();

    // Relative upload path, resolved in the ssh login user's home
    let upload = options.remote.as_ref().map(|target| {
        let uploaded = spec.artifact_name();
        commands.push(target.upload(spec.artifact(), &uploaded));
        uploaded
    });
    let source = upload.clone().unwrap_or_else(|| path_arg(spec.artifact()));

    commands.push(CommandSpec::new("cp").arg(source).arg(destination.as_str()));
    commands.push(
        CommandSpec::new("chown")
            .arg(spec.owner())
            .arg(destination.as_str()),
    );
    commands.push(CommandSpec::new("chmod").arg("755").arg(destination.as_str()));
    if let Some(uploaded) = upload {
        commands.push(CommandSpec::new("rm").arg("-f").arg(uploaded).non_fatal());
    }

    Step::new("deploy artifact", commands)
}

/// Step 5: install the systemd unit and reload systemd
pub fn service_definition(options: &DeployOptions) -> Step {
    let spec = &options.spec;
    let service = spec.service_name();
    let target = options.layout.unit_file(&service);

    let mut commands = stage_and_move(options, &service, render_unit(options), &target);
    commands.push(CommandSpec::new("systemctl").arg("daemon-reload"));

    Step::new("generate service definition", commands)
}

/// Step 6: install nginx, enable the site, validate, restart
///
/// A rejected site is unlinked again so a later reload cannot pick it up.
pub fn reverse_proxy(options: &DeployOptions) -> Step {
    let name = options.spec.app_name();
    let site = options.layout.site_file(name);
    let link = path_arg(&options.layout.enabled_site_link(name));

    let mut commands = vec![CommandSpec::new("apt-get").args(["install", "-y", "nginx"])];
    commands.extend(stage_and_move(
        options,
        &format!("{}_nginx", name),
        render_site(options),
        &site,
    ));
    commands.push(
        CommandSpec::new("ln")
            .arg("-sf")
            .arg(path_arg(&site))
            .arg(link.as_str()),
    );
    commands.push(CommandSpec::new("nginx").arg("-t").validator());
    commands.push(CommandSpec::new("systemctl").args(["restart", "nginx"]));

    Step::new("configure reverse proxy", commands)
        .on_rejected(vec![CommandSpec::new("rm").arg("-f").arg(link).non_fatal()])
}

/// Step 7: open ssh, the proxy and the application port, then enable ufw
pub fn firewall(options: &DeployOptions) -> Step {
    Step::new(
        "configure firewall",
        vec![
            CommandSpec::new("ufw").args(["allow", "ssh"]),
            CommandSpec::new("ufw").args(["allow", options.proxy.firewall_profile.as_str()]),
            CommandSpec::new("ufw")
                .arg("allow")
                .arg(options.spec.port().to_string()),
            CommandSpec::new("ufw").args(["--force", "enable"]),
        ],
    )
}

/// Steps 1-7 in execution order
pub fn provisioning_steps(options: &DeployOptions) -> Vec<Step> {
    vec![
        install_runtime(options),
        create_account(options),
        prepare_directories(options),
        deploy_artifact(options),
        service_definition(options),
        reverse_proxy(options),
        firewall(options),
    ]
}
