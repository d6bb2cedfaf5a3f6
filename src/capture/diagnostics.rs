//! Process and OS snapshots attached to diagnostic records

use serde::Serialize;
use std::fmt;
use sysinfo::{Process, ProcessRefreshKind, ProcessesToUpdate, System};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// Resident set size of this process, in bytes
    pub rss: u64,
    pub virtual_memory: u64,
    pub total_memory: u64,
    pub used_memory: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub pid: u32,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub cwd: Option<String>,
    pub exec_path: Option<String>,
    pub version: String,
    pub argv: Vec<String>,
    pub memory_usage: MemoryUsage,
}

impl ProcessInfo {
    pub fn collect() -> Self {
        let snapshot = snapshot();
        Self {
            pid: std::process::id(),
            uid: snapshot.uid,
            gid: snapshot.gid,
            cwd: std::env::current_dir()
                .ok()
                .map(|dir| dir.display().to_string()),
            exec_path: std::env::current_exe()
                .ok()
                .map(|exe| exe.display().to_string()),
            version: runtime_version().to_string(),
            argv: std::env::args().collect(),
            memory_usage: snapshot.memory,
        }
    }
}

/// Compiler that built this binary, as reported by `rustc --version`
pub fn runtime_version() -> &'static str {
    option_env!("LOGFAN_RUSTC_VERSION").unwrap_or("rustc unknown")
}

#[derive(Default)]
struct Snapshot {
    uid: Option<u32>,
    gid: Option<u32>,
    memory: MemoryUsage,
}

fn snapshot() -> Snapshot {
    let mut system = System::new();
    system.refresh_memory();

    let mut snapshot = Snapshot {
        memory: MemoryUsage {
            total_memory: system.total_memory(),
            used_memory: system.used_memory(),
            ..Default::default()
        },
        ..Default::default()
    };

    if let Ok(pid) = sysinfo::get_current_pid() {
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        if let Some(process) = system.process(pid) {
            snapshot.memory.rss = process.memory();
            snapshot.memory.virtual_memory = process.virtual_memory();
            (snapshot.uid, snapshot.gid) = ids(process);
        }
    }
    snapshot
}

#[cfg(unix)]
fn ids(process: &Process) -> (Option<u32>, Option<u32>) {
    (
        process.user_id().map(|uid| **uid),
        process.group_id().map(|gid| *gid),
    )
}

#[cfg(not(unix))]
fn ids(_process: &Process) -> (Option<u32>, Option<u32>) {
    (None, None)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsInfo {
    /// 1, 5 and 15 minute load averages; zeros where unsupported
    pub loadavg: [f64; 3],
    /// Seconds since boot
    pub uptime: u64,
}

impl OsInfo {
    pub fn collect() -> Self {
        let load = System::load_average();
        Self {
            loadavg: [load.one, load.five, load.fifteen],
            uptime: System::uptime(),
        }
    }
}

/// One entry of the `trace` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    /// Full path of the function, e.g. `app::server::handle`
    pub function: Option<String>,
    /// Last path segment of `function`
    pub method: Option<String>,
    /// No source information was available
    pub is_native: bool,
}

impl StackFrame {
    pub(crate) fn new(
        file: String,
        line: Option<u32>,
        column: Option<u32>,
        function: Option<String>,
    ) -> Self {
        Self {
            file: Some(file),
            line,
            column,
            method: function.as_deref().map(method_of),
            function,
            is_native: false,
        }
    }

    pub(crate) fn native(function: Option<String>) -> Self {
        Self {
            file: None,
            line: None,
            column: None,
            method: function.as_deref().map(method_of),
            function,
            is_native: true,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = self.function.as_deref().unwrap_or("<unknown>");
        match &self.file {
            Some(file) => write!(
                f,
                "{} ({}:{}:{})",
                function,
                file,
                self.line.unwrap_or(0),
                self.column.unwrap_or(0)
            ),
            None => write!(f, "{} (native)", function),
        }
    }
}

fn method_of(function: &str) -> String {
    function
        .rsplit("::")
        .next()
        .unwrap_or(function)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_info_shape() {
        let info = ProcessInfo::collect();
        assert_eq!(info.pid, std::process::id());
        assert!(info.version.starts_with("rustc "));
        assert!(!info.argv.is_empty());

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("execPath").is_some());
        assert!(json["memoryUsage"].get("rss").is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_ids_present() {
        let info = ProcessInfo::collect();
        assert!(info.uid.is_some());
        assert!(info.gid.is_some());
    }

    #[test]
    fn test_os_info_serializes() {
        let json = serde_json::to_value(OsInfo::collect()).unwrap();
        assert_eq!(json["loadavg"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_frame_method_and_display() {
        let frame = StackFrame::new(
            "src/server.rs".to_string(),
            Some(10),
            Some(5),
            Some("app::server::handle".to_string()),
        );
        assert_eq!(frame.method.as_deref(), Some("handle"));
        assert_eq!(frame.to_string(), "app::server::handle (src/server.rs:10:5)");

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["isNative"], false);

        let native = StackFrame::native(None);
        assert!(native.is_native);
        assert_eq!(native.to_string(), "<unknown> (native)");
    }
}
