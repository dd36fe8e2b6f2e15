// SPDX-License-Identifier: MPL-2.0
//! Device and system metadata.
//!
//! Used for the session marker written at every logger setup and for the
//! metadata chapter of a report.

use std::collections::BTreeMap;
use std::path::Path;

use sysinfo::{Disks, System};

/// Free and total space of the disk holding a given directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskSpace {
    pub available_bytes: u64,
    pub total_bytes: u64,
}

impl DiskSpace {
    /// Looks up the disk whose mount point is the longest prefix of `path`.
    #[must_use]
    pub fn for_path(path: &Path) -> Option<Self> {
        let disks = Disks::new_with_refreshed_list();

        let mut best_match: Option<(&sysinfo::Disk, usize)> = None;
        for disk in &disks {
            let mount_point = disk.mount_point();
            if path.starts_with(mount_point) {
                let len = mount_point.as_os_str().len();
                if best_match.is_none_or(|(_, best_len)| len > best_len) {
                    best_match = Some((disk, len));
                }
            }
        }

        best_match.map(|(disk, _)| Self {
            available_bytes: disk.available_space(),
            total_bytes: disk.total_space(),
        })
    }

    /// Disk holding the user's home directory.
    #[must_use]
    pub fn for_home() -> Option<Self> {
        let home = dirs::home_dir()?;
        Self::for_path(&home)
    }
}

/// Snapshot of the host system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// Operating system distribution name (e.g., "Linux Mint", "Windows 11", "macOS")
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
    pub cpu_arch: String,
    pub cpu_cores: usize,
    pub ram_total_bytes: u64,
    pub disk: Option<DiskSpace>,
    pub process_id: u32,
}

impl SystemInfo {
    /// Collects current system information.
    #[must_use]
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_list(sysinfo::CpuRefreshKind::nothing());

        Self {
            os_name: System::name().unwrap_or_else(|| "unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            kernel_version: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            cpu_arch: std::env::consts::ARCH.to_string(),
            cpu_cores: sys.cpus().len(),
            ram_total_bytes: sys.total_memory(),
            disk: DiskSpace::for_home(),
            process_id: std::process::id(),
        }
    }

    /// Pairs shown in the session marker, in display order.
    #[must_use]
    pub fn session_pairs(&self, app_version: &str) -> Vec<(String, String)> {
        vec![
            ("System".to_string(), self.os_name.clone()),
            ("OS version".to_string(), self.os_version.clone()),
            ("App version".to_string(), app_version.to_string()),
            ("Free disk space".to_string(), self.free_disk_space()),
            ("Process id".to_string(), self.process_id.to_string()),
        ]
    }

    /// Full key/value view for the metadata chapter.
    #[must_use]
    pub fn to_mapping(&self, app_name: &str, app_version: &str) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert("App name".to_string(), app_name.to_string());
        metadata.insert("App version".to_string(), app_version.to_string());
        metadata.insert("System".to_string(), self.os_name.clone());
        metadata.insert("OS version".to_string(), self.os_version.clone());
        metadata.insert("Kernel version".to_string(), self.kernel_version.clone());
        metadata.insert("CPU architecture".to_string(), self.cpu_arch.clone());
        metadata.insert("CPU cores".to_string(), self.cpu_cores.to_string());
        metadata.insert("Memory".to_string(), format_bytes(self.ram_total_bytes));
        metadata.insert("Free disk space".to_string(), self.free_disk_space());
        metadata
    }

    fn free_disk_space(&self) -> String {
        self.disk.map_or_else(
            || "unknown".to_string(),
            |disk| {
                format!(
                    "{} of {}",
                    format_bytes(disk.available_bytes),
                    format_bytes(disk.total_bytes)
                )
            },
        )
    }
}

/// Formats a byte count with decimal units, without fraction digits.
///
/// `800_000_000` becomes `"800 MB"`, `8_000_000_000` becomes `"8 GB"`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1000 && unit < UNITS.len() - 1 {
        value /= 1000;
        unit += 1;
    }
    format!("{value} {}", UNITS[unit])
}
