//! Host metric sampling via `sysinfo`.

use std::sync::Mutex;

use clipdeck_core::{HostFacts, MemoryFacts, NetworkUsage, SystemMetrics};
use sysinfo::{Disks, Networks, System};

#[cfg(test)]
use mockall::automock;

/// Samples live resource metrics and reports static hardware facts.
///
/// Static facts are gathered once (CPU model and memory size do not change
/// while the process runs) and returned by value on every call so the push
/// loop never blocks on them.
#[cfg_attr(test, automock)]
pub trait SystemMonitor: Send + Sync {
    /// Takes a fresh usage sample.
    fn sample(&self) -> SystemMetrics;

    /// Returns the static hardware descriptors.
    fn facts(&self) -> HostFacts;
}

/// [`SystemMonitor`] backed by the `sysinfo` crate.
pub struct SysinfoMonitor {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
    facts: HostFacts,
}

impl SysinfoMonitor {
    /// Initializes the monitor and captures the static facts.
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_all();

        let cpu_name = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let facts = HostFacts {
            cpu_name,
            cpu_cores: system.physical_core_count().unwrap_or(0),
            cpu_threads: system.cpus().len(),
            memory_info: MemoryFacts {
                total_gb: system.total_memory() / (1024 * 1024 * 1024),
            },
        };

        Self {
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            facts,
        }
    }
}

impl Default for SysinfoMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMonitor for SysinfoMonitor {
    fn sample(&self) -> SystemMetrics {
        let (cpu_usage, memory_usage) = {
            let mut system = self.system.lock().expect("lock poisoned");
            system.refresh_cpu();
            system.refresh_memory();

            let cpus = system.cpus();
            let cpu_usage = if cpus.is_empty() {
                0.0
            } else {
                cpus.iter().map(|cpu| f64::from(cpu.cpu_usage())).sum::<f64>() / cpus.len() as f64
            };
            let memory_usage = if system.total_memory() == 0 {
                0.0
            } else {
                system.used_memory() as f64 / system.total_memory() as f64 * 100.0
            };
            (cpu_usage, memory_usage)
        };

        let disk_usage = {
            let mut disks = self.disks.lock().expect("lock poisoned");
            disks.refresh();
            let (mut total, mut available) = (0u64, 0u64);
            for disk in disks.list() {
                total += disk.total_space();
                available += disk.available_space();
            }
            if total == 0 {
                0.0
            } else {
                (total - available) as f64 / total as f64 * 100.0
            }
        };

        let network_usage = {
            let mut networks = self.networks.lock().expect("lock poisoned");
            networks.refresh();
            let mut usage = NetworkUsage {
                bytes_sent: 0,
                bytes_recv: 0,
            };
            for data in networks.list().values() {
                usage.bytes_sent += data.total_transmitted();
                usage.bytes_recv += data.total_received();
            }
            usage
        };

        SystemMetrics {
            cpu_usage,
            memory_usage,
            disk_usage,
            network_usage,
        }
    }

    fn facts(&self) -> HostFacts {
        self.facts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reports_percentages_in_range() {
        let monitor = SysinfoMonitor::new();
        let metrics = monitor.sample();
        assert!((0.0..=100.0).contains(&metrics.cpu_usage));
        assert!((0.0..=100.0).contains(&metrics.memory_usage));
        assert!((0.0..=100.0).contains(&metrics.disk_usage));
    }

    #[test]
    fn test_facts_are_stable_across_calls() {
        let monitor = SysinfoMonitor::new();
        assert_eq!(monitor.facts(), monitor.facts());
    }

    #[test]
    fn test_mock_monitor_returns_scripted_metrics() {
        let mut mock = MockSystemMonitor::new();
        mock.expect_sample().returning(|| SystemMetrics {
            cpu_usage: 55.0,
            memory_usage: 44.0,
            disk_usage: 33.0,
            network_usage: NetworkUsage {
                bytes_sent: 1,
                bytes_recv: 2,
            },
        });

        assert_eq!(mock.sample().cpu_usage, 55.0);
    }
}
