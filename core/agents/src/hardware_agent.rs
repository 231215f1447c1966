//! Sensory agent: snapshots CPU/RAM/disk/temperature state via `sysinfo`,
//! persists it, and produces a short human summary. Grounded on
//! `original_source/agents/hardware_agent.py`. The original's optional
//! `GPUtil` integration has no portable Rust equivalent in this stack, so
//! the GPU section of the snapshot is always empty (documented in
//! DESIGN.md) rather than shelling out to a vendor tool.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use sysinfo::{Components, Disks, System};

use mnemos_engine::{Agent, AgentContext, EngineError, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryScope, MemoryType};

pub struct HardwareAgent;

fn gather_snapshot() -> Value {
    let mut sys = System::new_all();
    sys.refresh_all();

    let logical_cores = sys.cpus().len();
    let physical_cores = System::physical_core_count().unwrap_or(logical_cores);
    let cpu_percent = sys.global_cpu_usage();
    let per_core: Vec<f32> = sys.cpus().iter().map(|c| c.cpu_usage()).collect();

    let total_mem_mb = sys.total_memory() as f64 / (1024.0 * 1024.0);
    let used_mem_mb = sys.used_memory() as f64 / (1024.0 * 1024.0);
    let available_mem_mb = sys.available_memory() as f64 / (1024.0 * 1024.0);
    let mem_percent = if sys.total_memory() > 0 {
        (sys.used_memory() as f64 / sys.total_memory() as f64) * 100.0
    } else {
        0.0
    };

    let total_swap_mb = sys.total_swap() as f64 / (1024.0 * 1024.0);
    let used_swap_mb = sys.used_swap() as f64 / (1024.0 * 1024.0);
    let swap_percent = if sys.total_swap() > 0 {
        (sys.used_swap() as f64 / sys.total_swap() as f64) * 100.0
    } else {
        0.0
    };

    let disks = Disks::new_with_refreshed_list();
    let disk_partitions: Vec<Value> = disks
        .iter()
        .map(|d| {
            let total_gb = d.total_space() as f64 / (1024.0_f64.powi(3));
            let avail_gb = d.available_space() as f64 / (1024.0_f64.powi(3));
            let used_gb = (total_gb - avail_gb).max(0.0);
            let percent = if total_gb > 0.0 { (used_gb / total_gb) * 100.0 } else { 0.0 };
            json!({
                "mountpoint": d.mount_point().to_string_lossy(),
                "fstype": d.file_system().to_string_lossy(),
                "total_gb": (total_gb * 100.0).round() / 100.0,
                "used_gb": (used_gb * 100.0).round() / 100.0,
                "free_gb": (avail_gb * 100.0).round() / 100.0,
                "percent": (percent * 10.0).round() / 10.0,
            })
        })
        .collect();

    let components = Components::new_with_refreshed_list();
    let mut temps: Vec<Value> = Vec::new();
    for c in components.iter() {
        if let Some(temp) = c.temperature() {
            temps.push(json!({ "label": c.label(), "current": temp }));
        }
    }

    json!({
        "timestamp": Utc::now().to_rfc3339(),
        "os": {
            "system": System::name().unwrap_or_default(),
            "release": System::kernel_version().unwrap_or_default(),
            "version": System::long_os_version().unwrap_or_default(),
        },
        "cpu": {
            "logical_cores": logical_cores,
            "physical_cores": physical_cores,
            "percent": cpu_percent,
            "per_core_percent": per_core,
        },
        "memory": {
            "total_mb": total_mem_mb,
            "used_mb": used_mem_mb,
            "available_mb": available_mem_mb,
            "percent": mem_percent,
        },
        "swap": {
            "total_mb": total_swap_mb,
            "used_mb": used_swap_mb,
            "percent": swap_percent,
        },
        "disks": disk_partitions,
        "temperatures": temps,
        "gpus": Value::Array(vec![]),
    })
}

fn build_human_summary(snapshot: &Value) -> String {
    let cpu = &snapshot["cpu"];
    let mem = &snapshot["memory"];
    let disks = snapshot["disks"].as_array().cloned().unwrap_or_default();
    let temps = snapshot["temperatures"].as_array().cloned().unwrap_or_default();

    let mut lines = Vec::new();
    lines.push("Current hardware status:".to_string());
    lines.push(format!(
        "- CPU: {:.1}% usage across {} logical core(s) ({} physical)",
        cpu["percent"].as_f64().unwrap_or(0.0),
        cpu["logical_cores"],
        cpu["physical_cores"],
    ));
    lines.push(format!(
        "- RAM: {:.0} / {:.0} MB ({:.1}% in use)",
        mem["used_mb"].as_f64().unwrap_or(0.0),
        mem["total_mb"].as_f64().unwrap_or(0.0),
        mem["percent"].as_f64().unwrap_or(0.0),
    ));

    if let Some(main_disk) = disks.first() {
        lines.push(format!(
            "- Main disk ({}): {:.1} / {:.1} GB ({:.1}% in use)",
            main_disk["mountpoint"].as_str().unwrap_or("?"),
            main_disk["used_gb"].as_f64().unwrap_or(0.0),
            main_disk["total_gb"].as_f64().unwrap_or(0.0),
            main_disk["percent"].as_f64().unwrap_or(0.0),
        ));
    } else {
        lines.push("- Disk: no readable partitions found.".to_string());
    }

    if let Some(t) = temps.first() {
        lines.push(format!(
            "- Temperature: {:.1}°C (sensor {})",
            t["current"].as_f64().unwrap_or(0.0),
            t["label"].as_str().unwrap_or("unknown"),
        ));
    } else {
        lines.push("- Temperature: no sensors available or insufficient permissions.".to_string());
    }

    lines.push(String::new());
    lines.push("I've saved a detailed snapshot to internal memory (key: hardware_snapshot).".to_string());

    lines.join("\n")
}

#[async_trait]
impl Agent for HardwareAgent {
    fn name(&self) -> &str {
        "hardware_agent"
    }

    async fn run_impl(
        &self,
        _input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let snapshot = tokio::task::spawn_blocking(gather_snapshot)
            .await
            .map_err(|e| EngineError::Other(format!("hardware_agent task join error: {e}")))?;

        let summary_text = build_human_summary(&snapshot);

        memory
            .store_item(
                MemoryScope::Global,
                MemoryType::Procedural,
                "hardware_snapshot",
                serde_json::to_string(&snapshot).unwrap_or_default(),
                json!({ "created_at": snapshot["timestamp"], "source_agent": "hardware_agent" }),
            )
            .await?;

        Ok(AgentResult::success(
            json!({
                "user_visible_message": summary_text,
                "hardware_snapshot": snapshot,
                "stop_for_user_input": false,
            }),
            EmotionDelta { confidence: 0.03, curiosity: 0.02, ..Default::default() },
        ))
    }
}
