//! End-to-end tool scenarios against a scripted command runner. No
//! network: each test seeds captured CLI output keyed by the exact
//! command the handler is expected to send.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    async_trait::async_trait,
    serde_json::{json, Value},
};

use {
    aosd_config::AosdConfig,
    aosd_ssh::{CommandResult, CommandRunner, Device, SshError},
    aosd_tools::{ToolCall, ToolService},
};

/// Replays canned stdout per command and records the call order.
#[derive(Default)]
struct ScriptedRunner {
    outputs: HashMap<String, String>,
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn with(mut self, command: &str, stdout: &str) -> Self {
        self.outputs.insert(command.to_string(), stdout.to_string());
        self
    }

    fn failing_on(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        _device: &Device,
        command: &str,
        _timeout: Option<Duration>,
    ) -> Result<CommandResult, SshError> {
        self.calls.lock().expect("calls lock").push(command.to_string());
        if self.failing.iter().any(|c| c == command) {
            return Err(SshError::Transport("connection reset by peer".into()));
        }
        Ok(CommandResult {
            stdout: self.outputs.get(command).cloned().unwrap_or_default(),
            stderr: String::new(),
            exit_status: Some(0),
            duration_ms: 3,
            truncated: false,
        })
    }
}

fn service(runner: ScriptedRunner) -> (ToolService, Arc<ScriptedRunner>) {
    let runner = Arc::new(runner);
    let service =
        ToolService::new(&AosdConfig::default(), runner.clone()).expect("service");
    (service, runner)
}

async fn call(service: &ToolService, tool: &str, args: Value) -> aosd_tools::ToolResult {
    service
        .call(ToolCall {
            context: Default::default(),
            tool: tool.to_string(),
            args,
        })
        .await
}

fn lanpower_fixture(ports: usize) -> String {
    let mut out = String::from(
        " Port   Maximum(mW)  Actual Used(mW)  Status       Priority  On/Off  Class  Type\n\
         --------+-----------+----------------+------------+---------+-------+------+------\n",
    );
    for p in 1..=ports {
        out.push_str(&format!(
            "1/1/{p}    60000       {}             Powered On   Low       ON      2\n",
            1000 + p
        ));
    }
    out.push_str(
        "\n ChassisId 1 Slot 1 Max Watts 780\n\
         110 Watts Actual Power Consumed\n\
         670 Watts Actual Power Budget Remaining\n\
         780 Watts Total Power Budget Available\n\
         1 Power Supply Available\n",
    );
    out
}

// S1: PoE diagnostics parse all ports and the chassis budget.
#[tokio::test]
async fn poe_diagnostics_parse_ports_and_budget() {
    let (service, runner) = service(
        ScriptedRunner::default().with("show lanpower slot 1/1", &lanpower_fixture(24)),
    );

    let result = call(&service, "aos.diag.poe", json!({ "host": "10.0.0.1" })).await;

    assert_eq!(result.status, "ok");
    let data = result.data.expect("data");
    assert_eq!(data["ports"].as_array().expect("ports").len(), 24);
    assert!(data["chassis_summary"]["total_power_budget_watts"].as_u64().expect("budget") > 0);
    assert_eq!(data["commands_executed"], json!(["show lanpower slot 1/1"]));
    assert_eq!(runner.calls(), vec!["show lanpower slot 1/1"]);
}

// S2: MAC lookup normalizes the address and returns the canonical entry.
#[tokio::test]
async fn mac_lookup_normalizes_and_finds_entry() {
    let fixture = "\
   Domain    Vlan/SrvcId/[ISId/vnId]  Mac Address         Type       Operation  Interface
------------+------------------------+-------------------+----------+----------+----------
   VLAN      1098                     70:4C:A5:50:45:CE    dynamic    bridging   1/1/24
 Total number of Valid MAC addresses above = 1
";
    let (service, _) = service(
        ScriptedRunner::default().with("show mac-learning mac 70:4c:a5:50:45:ce", fixture),
    );

    let result = call(
        &service,
        "aos.mac.lookup",
        json!({ "host": "10.0.0.1", "mac_address": "70:4C:A5:50:45:CE" }),
    )
    .await;

    assert_eq!(result.status, "ok");
    let data = result.data.expect("data");
    assert_eq!(
        data["entries"],
        json!([{
            "mac_address": "70:4c:a5:50:45:ce",
            "vlan": 1098,
            "port": "1/1/24",
            "type": "dynamic",
        }])
    );
}

// S3: single-port discovery composes all six commands.
#[tokio::test]
async fn port_discover_aggregates_all_sources() {
    let status = "\
-----+------+-----+-------+--------+-------+------+-------+-------+-----+-----+----
 1/1/19      en    en    1000   Full     -     DIS   Auto    Auto     -    AUTO  en
";
    let detail = "\
Chassis/Slot/Port  1/1/19 :
  Interface Type         : Copper,
  SFP/XFP                : N/A,
  MAC address            : 2c:fa:a2:5e:33:84,
  Bytes Received  :         919843215, Unicast Frames :           2185021,
";
    let members = "\
   vlan      type        status
--------+-----------+---------------
    51    untagged    forwarding
   101    tagged      forwarding
";
    let macs = "\
   VLAN      51                       00:15:65:d3:71:99    dynamic    bridging   1/1/19
";
    let lldp = "\
Remote LLDP nearest-bridge Agents on Local Port 1/1/19:
  Chassis 10.9.19.60, Port 00:15:65:d3:71:99:
    Port Description          = WAN PORT,
    System Name               = SIP-T46U,
    Management IP Address     = 10.9.19.60,
";
    let runner = ScriptedRunner::default()
        .with("show interfaces 1/1/19 status", status)
        .with("show interfaces 1/1/19", detail)
        .with("show vlan members port 1/1/19", members)
        .with("show mac-learning port 1/1/19", macs)
        .with("show lldp port 1/1/19 remote-system", lldp)
        .with("show lanpower slot 1/1", &lanpower_fixture(24));
    let (service, runner) = service(runner);

    let result = call(
        &service,
        "aos.port.discover",
        json!({ "host": "10.9.19.10", "port_id": "1/1/19" }),
    )
    .await;

    assert_eq!(result.status, "ok");
    let data = result.data.expect("data");
    let port = &data["port"];
    assert_eq!(port["admin_state"], "enabled");
    assert_eq!(port["oper_state"], "up");
    assert_eq!(port["vlan"]["untagged"], 51);
    assert_eq!(port["vlan"]["tagged"], json!([101]));
    assert_eq!(port["lldp_neighbor"]["system_name"], "SIP-T46U");
    assert_eq!(port["poe"]["enabled"], true);
    assert_eq!(data["commands_executed"].as_array().expect("commands").len(), 6);
    assert_eq!(runner.calls().len(), 6);
}

// S4: routing audit flags an OSPF neighbor stuck in Init.
#[tokio::test]
async fn routing_audit_flags_bad_neighbor_state() {
    let vrf = "\
Virtual Routers        Profile    Protocols
-----------------------+---------+------------
default                default    OSPF
";
    let neighbors = "\
  IP Address      Address         Area Id     Router    Id       State
-----------------+---------------+----------+--------+----------+--------
10.255.9.3        0.0.0.0         0.0.0.0     Vlan      1091      Init
";
    let runner = ScriptedRunner::default()
        .with("show vrf", vrf)
        .with("show ip ospf neighbor", neighbors);
    let (service, _) = service(runner);

    let result = call(
        &service,
        "aos.routing.audit",
        json!({ "host": "10.0.0.1", "include_routes": false }),
    )
    .await;

    assert_eq!(result.status, "ok");
    let data = result.data.expect("data");
    assert_eq!(data["summary"]["total_vrfs"], 1);
    let issues = data["issues"].as_array().expect("issues");
    assert!(
        issues
            .iter()
            .any(|i| i.as_str().is_some_and(|s| s.contains("10.255.9.3") && s.contains("Init"))),
        "issues: {issues:?}"
    );
}

#[tokio::test]
async fn routing_audit_prefixes_non_default_vrfs() {
    let vrf = "\
Virtual Routers        Profile    Protocols
-----------------------+---------+------------
default                default    RIP
tenant-a               default    OSPF
";
    let (service, runner) = service(ScriptedRunner::default().with("show vrf", vrf));

    let result = call(
        &service,
        "aos.routing.audit",
        json!({ "host": "10.0.0.1", "include_routes": false }),
    )
    .await;

    assert_eq!(result.status, "ok");
    let calls = runner.calls();
    assert!(calls.contains(&"vrf tenant-a show ip ospf neighbor".to_string()), "calls: {calls:?}");
    assert!(calls.contains(&"show ip interface".to_string()));
    assert!(calls.contains(&"vrf tenant-a show ip interface".to_string()));
}

// S5: the policy rejects a hostile command before any SSH activity.
#[tokio::test]
async fn policy_rejects_command_before_ssh() {
    let (service, runner) = service(ScriptedRunner::default());

    let result = call(
        &service,
        "aos.cli.readonly",
        json!({ "host": "10.0.0.1", "command": "rm -rf /" }),
    )
    .await;

    assert_eq!(result.status, "error");
    let error = result.error.expect("error");
    assert_eq!(error.code, "invalid_command");
    assert!(result.data.is_none());
    assert_eq!(result.meta["tool"], "aos.cli.readonly");
    assert!(runner.calls().is_empty(), "no SSH session may be opened");
}

#[tokio::test]
async fn unknown_tool_is_reported_as_such() {
    let (service, _) = service(ScriptedRunner::default());
    let result = call(&service, "aos.does.not.exist", json!({})).await;
    assert_eq!(result.status, "error");
    assert_eq!(result.error.expect("error").code, "unknown_tool");
    assert_eq!(result.meta["tool"], "aos.does.not.exist");
}

#[tokio::test]
async fn unknown_argument_fields_are_rejected() {
    let (service, runner) = service(ScriptedRunner::default());
    let result = call(
        &service,
        "aos.diag.poe",
        json!({ "host": "10.0.0.1", "bogus": true }),
    )
    .await;
    assert_eq!(result.status, "error");
    assert_eq!(result.error.expect("error").code, "invalid_request");
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn required_command_failure_surfaces_as_ssh_error() {
    let runner = ScriptedRunner::default()
        .with("show interfaces status", "----\n 1/1/1 en en 1000 Full\n")
        .failing_on("show vlan members");
    let (service, _) = service(runner);

    let result = call(
        &service,
        "aos.interfaces.discover",
        json!({ "host": "10.0.0.1" }),
    )
    .await;

    assert_eq!(result.status, "error");
    assert_eq!(result.error.expect("error").code, "ssh_error");
}

#[tokio::test]
async fn poe_restart_runs_disable_then_enable() {
    let (service, runner) = service(ScriptedRunner::default());

    let result = call(
        &service,
        "aos.poe.restart",
        json!({ "host": "10.0.0.1", "port_id": "1/1/12", "wait_seconds": 0 }),
    )
    .await;

    assert_eq!(result.status, "ok");
    let data = result.data.expect("data");
    assert_eq!(data["success"], true);
    assert_eq!(
        runner.calls(),
        vec![
            "lanpower port 1/1/12 admin-state disable",
            "lanpower port 1/1/12 admin-state enable",
        ]
    );
}

#[tokio::test]
async fn cli_output_is_redacted_when_rules_match() {
    let runner = ScriptedRunner::default().with(
        "show configuration snapshot",
        "snmp community s3cr3t-string\nother line\n",
    );
    let (service, _) = service(runner);

    let result = call(
        &service,
        "aos.cli.readonly",
        json!({ "host": "10.0.0.1", "command": "show configuration snapshot" }),
    )
    .await;

    assert_eq!(result.status, "ok");
    let data = result.data.expect("data");
    assert_eq!(data["redacted"], true);
    assert!(data["stdout"].as_str().expect("stdout").contains("community ***"));
    assert!(!data["stdout"].as_str().expect("stdout").contains("s3cr3t-string"));
}

#[tokio::test]
async fn mac_lookup_requires_exactly_one_selector() {
    let (service, _) = service(ScriptedRunner::default());

    let none = call(&service, "aos.mac.lookup", json!({ "host": "10.0.0.1" })).await;
    assert_eq!(none.error.expect("error").code, "invalid_request");

    let both = call(
        &service,
        "aos.mac.lookup",
        json!({ "host": "10.0.0.1", "mac_address": "aa:bb:cc:dd:ee:ff", "vlan": 5 }),
    )
    .await;
    assert_eq!(both.error.expect("error").code, "invalid_request");
}

#[tokio::test]
async fn vlan_audit_reports_summary_and_issues() {
    let fixture = "\
 vlan    type   admin   oper    ip    mtu          name
------+-------+-------+------+------+------+------------------
1      std       Ena     Dis   Dis    1500    NE PAS UTILISER
20     std       Ena     Ena   Ena    1500    USERS
";
    let (service, _) = service(ScriptedRunner::default().with("show vlan", fixture));

    let result = call(&service, "aos.vlan.audit", json!({ "host": "10.0.0.1" })).await;

    assert_eq!(result.status, "ok");
    let data = result.data.expect("data");
    assert_eq!(data["summary"]["total"], 2);
    let issues = data["issues"].as_array().expect("issues");
    // VLAN 1 enabled-but-down, default-vlan warning, and the suspicious name.
    assert!(issues.iter().any(|i| i.as_str().is_some_and(|s| s.contains("VLAN 1 "))));
    assert!(issues.iter().any(|i| i.as_str().is_some_and(|s| s.contains("Default VLAN"))));
}
