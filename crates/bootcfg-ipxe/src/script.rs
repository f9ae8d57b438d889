//! iPXE script generation

use crate::error::{IpxeError, Result};
use bootcfg_model::{Boot, Profile};

/// Script served at `/boot.ipxe`. iPXE expands the `${...}` settings and
/// chains back to the server with the machine's labels as query parameters.
pub const BOOTSTRAP_SCRIPT: &str = "#!ipxe\n\
chain ipxe?uuid=${uuid}&mac=${mac:hexhyp}&domain=${domain}&hostname=${hostname}&serial=${serial}\n";

/// Generate the iPXE script for a Profile. A Profile without boot
/// parameters cannot be network booted.
pub fn profile_script(profile: &Profile) -> Result<String> {
    let boot = profile
        .boot
        .as_ref()
        .ok_or_else(|| IpxeError::MissingBoot(profile.id.clone()))?;
    boot_script(boot)
}

/// Generate an iPXE script from boot parameters
///
/// ```text
/// #!ipxe
/// kernel <kernel> <k=v | k>...
/// initrd <initrd> <initrd>
/// boot
/// ```
///
/// Kernel arguments are emitted in key order. iPXE's `initrd` command
/// requires an image argument and a bare `initrd` aborts the script, so
/// the line is left out when there are no initrds.
pub fn boot_script(boot: &Boot) -> Result<String> {
    boot.validate()?;

    let mut script = String::from("#!ipxe\n");

    script.push_str("kernel ");
    script.push_str(&boot.kernel);
    let args = kernel_args(boot);
    if !args.is_empty() {
        script.push(' ');
        script.push_str(&args);
    }
    script.push('\n');

    if !boot.initrd.is_empty() {
        script.push_str("initrd ");
        for initrd in &boot.initrd {
            script.push_str(initrd);
            script.push(' ');
        }
        script.push('\n');
    }

    script.push_str("boot\n");
    Ok(script)
}

/// Flatten the cmdline map into a kernel argument string
pub fn kernel_args(boot: &Boot) -> String {
    boot.cmdline
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                key.clone()
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_boot() -> Boot {
        Boot::new("/image/kernel")
            .with_initrd("/image/initrd_a")
            .with_initrd("/image/initrd_b")
            .with_arg("a", "b")
            .with_arg("c", "")
    }

    #[test]
    fn test_boot_script() {
        let script = boot_script(&test_boot()).unwrap();
        assert_eq!(
            script,
            "#!ipxe\nkernel /image/kernel a=b c\ninitrd /image/initrd_a /image/initrd_b \nboot\n"
        );
    }

    #[test]
    fn test_kernel_only() {
        let script = boot_script(&Boot::new("http://example.com/vmlinuz")).unwrap();
        assert_eq!(script, "#!ipxe\nkernel http://example.com/vmlinuz\nboot\n");
    }

    #[test]
    fn test_args_are_sorted() {
        let boot = Boot::new("/k")
            .with_arg("zeta", "1")
            .with_arg("alpha", "")
            .with_arg("coreos.autologin", "");
        assert_eq!(kernel_args(&boot), "alpha coreos.autologin zeta=1");
    }

    #[test]
    fn test_profile_without_boot() {
        let err = profile_script(&Profile::new("no-boot")).unwrap_err();
        assert!(matches!(err, IpxeError::MissingBoot(id) if id == "no-boot"));
    }

    #[test]
    fn test_empty_kernel_rejected() {
        let profile = Profile::new("broken").with_boot(Boot::new(""));
        assert!(matches!(profile_script(&profile), Err(IpxeError::InvalidBoot(_))));
    }

    #[test]
    fn test_bootstrap_script() {
        assert!(BOOTSTRAP_SCRIPT.starts_with("#!ipxe\nchain ipxe?"));
        assert!(BOOTSTRAP_SCRIPT.contains("mac=${mac:hexhyp}"));
        assert!(BOOTSTRAP_SCRIPT.ends_with("serial=${serial}\n"));
    }
}
