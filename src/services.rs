// services.rs — the facade pages talk to for network, WiFi and tunnels
//
// Pages only ever see `dyn Services`. Every call is synchronous and reports
// failure as a human-readable string that the page renders inline.
//
// `LocalServices` is the on-device implementation: live interface state is
// read from /sys and /proc, while requested changes (WiFi profiles, IP
// settings, tunnels) go to a JSON state file picked up by the system's
// network and tunnel adapters.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::ServicesConfig;
use crate::sys;

// ── data ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub current_interface: String,
    pub ip: String,
    pub netmask: String,
    pub gateway: String,
    pub dns: String,
    /// `connected` or `disconnected`.
    pub status: String,
    /// `static` or `dhcp`.
    pub ip_mode: String,
}

impl NetworkStatus {
    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub ssid: String,
    /// 0..=100
    pub signal: u8,
    /// WPA2 / WPA3 / OPEN ...
    pub security: String,
    #[serde(default)]
    pub in_use: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelKind {
    #[default]
    Tcp,
    Udp,
    Http,
    Https,
    Stcp,
}

impl TunnelKind {
    pub const ALL: [TunnelKind; 5] = [
        TunnelKind::Tcp,
        TunnelKind::Udp,
        TunnelKind::Http,
        TunnelKind::Https,
        TunnelKind::Stcp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TunnelKind::Tcp => "tcp",
            TunnelKind::Udp => "udp",
            TunnelKind::Http => "http",
            TunnelKind::Https => "https",
            TunnelKind::Stcp => "stcp",
        }
    }

    /// Web tunnels are addressed by domain instead of a remote port.
    pub fn is_web(self) -> bool {
        matches!(self, TunnelKind::Http | TunnelKind::Https)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TunnelKind,
    pub local_ip: String,
    pub local_port: u16,
    #[serde(default)]
    pub remote_port: u16,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub fallback_enabled: bool,
}

impl Tunnel {
    /// Field checks shared by add and update.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Tunnel name cannot be empty".into());
        }
        if self.local_ip.trim().is_empty() {
            return Err("Local IP cannot be empty".into());
        }
        if self.local_port == 0 {
            return Err("Local port must be 1-65535".into());
        }
        if !self.kind.is_web() && self.remote_port == 0 {
            return Err("Remote port must be 1-65535".into());
        }
        Ok(())
    }
}

// ── facade ────────────────────────────────────────────────────────────────────

pub trait Services {
    fn network_status(&mut self) -> Result<NetworkStatus, String>;
    fn scan_wifi(&mut self) -> Result<Vec<WifiNetwork>, String>;
    fn connect_wifi(&mut self, ssid: &str, password: &str) -> Result<(), String>;
    fn forget_wifi(&mut self, ssid: &str) -> Result<(), String>;
    /// Stored password of a remembered network.
    fn saved_wifi(&self, ssid: &str) -> Option<String>;
    fn apply_static_ip(
        &mut self,
        iface: &str,
        ip: &str,
        netmask: &str,
        gateway: &str,
        dns: &str,
    ) -> Result<(), String>;
    fn apply_dhcp(&mut self, iface: &str, dns: &str) -> Result<(), String>;
    /// `(up, down)` in KB/s for `iface` (empty = current uplink).
    fn transfer_rate_kbps(&mut self, iface: &str) -> (f64, f64);
    fn tunnels(&mut self) -> Result<Vec<Tunnel>, String>;
    fn add_tunnel(&mut self, tunnel: Tunnel) -> Result<(), String>;
    fn update_tunnel(&mut self, old_name: &str, tunnel: Tunnel) -> Result<(), String>;
    fn delete_tunnel(&mut self, name: &str) -> Result<(), String>;
    fn tunnels_connected(&self) -> bool;
}

// ── validation helpers ────────────────────────────────────────────────────────

pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, String> {
    s.trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| format!("Invalid IPv4 address: {}", s.trim()))
}

/// Accepts dotted form (`255.255.255.0`) or a prefix (`/24`, `24`).
pub fn parse_netmask(s: &str) -> Result<Ipv4Addr, String> {
    let t = s.trim();
    let prefix = t.strip_prefix('/').unwrap_or(t);
    if let Ok(n) = prefix.parse::<u32>() {
        if n > 32 {
            return Err(format!("Invalid prefix length: {t}"));
        }
        let bits = if n == 0 { 0 } else { u32::MAX << (32 - n) };
        return Ok(Ipv4Addr::from(bits));
    }
    let addr = parse_ipv4(t).map_err(|_| format!("Invalid netmask: {t}"))?;
    let bits = u32::from(addr);
    // contiguous ones followed by zeros
    if bits.leading_ones() + bits.trailing_zeros() != 32 {
        return Err(format!("Invalid netmask: {t}"));
    }
    Ok(addr)
}

// ── transfer rate ─────────────────────────────────────────────────────────────

const MIN_SAMPLE_GAP: Duration = Duration::from_millis(200);

/// Turns byte counters into KB/s between successive samples.
#[derive(Debug, Default)]
pub struct NetSpeedSampler {
    last: Option<Sample>,
    rate: (f64, f64),
}

#[derive(Debug, Clone)]
struct Sample {
    iface: String,
    at: Instant,
    rx: u64,
    tx: u64,
}

impl NetSpeedSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed counters observed at `at`; returns `(up, down)` KB/s.
    /// The first sample (or an interface change) yields 0; samples closer
    /// than 200 ms to the previous one return the previous rate.
    pub fn sample_at(&mut self, iface: &str, at: Instant, rx: u64, tx: u64) -> (f64, f64) {
        let Some(prev) = self.last.as_ref().filter(|s| s.iface == iface) else {
            self.last = Some(Sample {
                iface: iface.to_string(),
                at,
                rx,
                tx,
            });
            self.rate = (0.0, 0.0);
            return self.rate;
        };
        let dt = at.saturating_duration_since(prev.at);
        if dt < MIN_SAMPLE_GAP {
            return self.rate;
        }
        let secs = dt.as_secs_f64();
        let down = rx.saturating_sub(prev.rx) as f64 / 1024.0 / secs;
        let up = tx.saturating_sub(prev.tx) as f64 / 1024.0 / secs;
        self.last = Some(Sample {
            iface: iface.to_string(),
            at,
            rx,
            tx,
        });
        self.rate = (up, down);
        self.rate
    }

    /// Sample `/proc/net/dev`. Unknown interfaces fall back to the sum of all
    /// non-loopback interfaces.
    pub fn sample(&mut self, iface: &str) -> (f64, f64) {
        let Ok(text) = std::fs::read_to_string("/proc/net/dev") else {
            return self.rate;
        };
        let counters = parse_net_dev(&text);
        let (key, rx, tx) = match counters.get(iface) {
            Some(&(rx, tx)) => (iface.to_string(), rx, tx),
            None => {
                let (rx, tx) = counters
                    .iter()
                    .filter(|(n, _)| n.as_str() != "lo")
                    .fold((0u64, 0u64), |acc, (_, &(r, t))| (acc.0 + r, acc.1 + t));
                ("*".to_string(), rx, tx)
            }
        };
        self.sample_at(&key, Instant::now(), rx, tx)
    }
}

/// `iface → (rx_bytes, tx_bytes)` from `/proc/net/dev` text.
pub fn parse_net_dev(text: &str) -> HashMap<String, (u64, u64)> {
    text.lines()
        .skip(2)
        .filter_map(|line| {
            let (name, rest) = line.split_once(':')?;
            let cols: Vec<u64> = rest
                .split_whitespace()
                .map(|c| c.parse().unwrap_or(0))
                .collect();
            let rx = *cols.first()?;
            let tx = *cols.get(8)?;
            Some((name.trim().to_string(), (rx, tx)))
        })
        .collect()
}

/// Default gateway of `iface` from `/proc/net/route` text.
pub fn parse_route_gateway(text: &str, iface: &str) -> Option<Ipv4Addr> {
    text.lines().skip(1).find_map(|line| {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 3 || cols[0] != iface || cols[1] != "00000000" {
            return None;
        }
        let raw = u32::from_str_radix(cols[2], 16).ok()?;
        // printed as a host-order u32 whose memory bytes are network order
        Some(Ipv4Addr::from(raw.to_ne_bytes()))
    })
}

fn first_nameserver(text: &str) -> Option<String> {
    text.lines().find_map(|l| {
        let mut it = l.split_whitespace();
        match it.next() {
            Some("nameserver") => it.next().map(str::to_string),
            _ => None,
        }
    })
}

// ── local implementation ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct WifiProfile {
    ssid: String,
    password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct IpSettings {
    interface: String,
    mode: String,
    #[serde(default)]
    ip: String,
    #[serde(default)]
    netmask: String,
    #[serde(default)]
    gateway: String,
    #[serde(default)]
    dns: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct State {
    #[serde(default)]
    wifi_profiles: Vec<WifiProfile>,
    /// Last scan results, written by the WiFi adapter.
    #[serde(default)]
    wifi_scan: Vec<WifiNetwork>,
    #[serde(default)]
    ip: Option<IpSettings>,
    #[serde(default)]
    tunnels: Vec<Tunnel>,
    /// Written by the tunnel adapter.
    #[serde(default)]
    tunnels_connected: bool,
}

pub struct LocalServices {
    path: PathBuf,
    state: State,
    uplink: Option<String>,
    sysfs_net: PathBuf,
    sampler: NetSpeedSampler,
}

impl LocalServices {
    pub fn open(cfg: &ServicesConfig) -> Self {
        let mut s = Self::with_state_file(&cfg.state_file);
        s.uplink = cfg.uplink.clone();
        s
    }

    pub fn with_state_file(path: &Path) -> Self {
        let state = match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!("State file {} unreadable ({e}), starting empty", path.display());
                State::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(e) => {
                tracing::warn!("Could not read {}: {e}", path.display());
                State::default()
            }
        };
        tracing::info!(
            "Services state {}: {} wifi profiles, {} tunnels",
            path.display(),
            state.wifi_profiles.len(),
            state.tunnels.len()
        );
        Self {
            path: path.to_path_buf(),
            state,
            uplink: None,
            sysfs_net: PathBuf::from("/sys/class/net"),
            sampler: NetSpeedSampler::new(),
        }
    }

    /// Reload when another process rewrote the state file.
    fn refresh(&mut self) {
        if let Ok(text) = std::fs::read_to_string(&self.path) {
            match serde_json::from_str::<State>(&text) {
                Ok(s) => self.state = s,
                Err(e) => tracing::debug!("state refresh skipped: {e}"),
            }
        }
    }

    /// Persist `next` and only then make it the live state; a failed write
    /// leaves the previous state in place.
    fn commit(&mut self, next: State) -> Result<(), String> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| format!("Could not create {}: {e}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(&next).map_err(|e| e.to_string())?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|e| format!("Could not write state: {e}"))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| format!("Could not write state: {e}"))?;
        self.state = next;
        Ok(())
    }

    fn operstate(&self, iface: &str) -> String {
        std::fs::read_to_string(self.sysfs_net.join(iface).join("operstate"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    /// Configured uplink, else the first interface that is up, wired first.
    fn current_interface(&self) -> Option<String> {
        if let Some(u) = &self.uplink {
            return Some(u.clone());
        }
        let mut names: Vec<String> = std::fs::read_dir(&self.sysfs_net)
            .ok()?
            .flatten()
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| n != "lo")
            .collect();
        names.sort_by_key(|n| (is_wireless(n), n.clone()));
        names
            .iter()
            .find(|n| self.operstate(n) == "up")
            .or_else(|| names.first())
            .cloned()
    }
}

pub fn is_wireless(iface: &str) -> bool {
    iface.starts_with("wl")
}

impl Services for LocalServices {
    fn network_status(&mut self) -> Result<NetworkStatus, String> {
        let iface = self
            .current_interface()
            .ok_or_else(|| "No network interface found".to_string())?;
        let addr = sys::ipv4_addrs()
            .map_err(|e| format!("getifaddrs: {e}"))?
            .into_iter()
            .find(|a| a.name == iface);
        let gateway = std::fs::read_to_string("/proc/net/route")
            .ok()
            .and_then(|t| parse_route_gateway(&t, &iface));
        let dns = std::fs::read_to_string("/etc/resolv.conf")
            .ok()
            .and_then(|t| first_nameserver(&t))
            .unwrap_or_default();
        let up = self.operstate(&iface) == "up";
        let ip_mode = self
            .state
            .ip
            .as_ref()
            .filter(|s| s.interface == iface)
            .map(|s| s.mode.clone())
            .unwrap_or_else(|| "dhcp".into());

        Ok(NetworkStatus {
            current_interface: iface,
            ip: addr.as_ref().map(|a| a.addr.to_string()).unwrap_or_default(),
            netmask: addr
                .as_ref()
                .and_then(|a| a.netmask)
                .map(|m| m.to_string())
                .unwrap_or_default(),
            gateway: gateway.map(|g| g.to_string()).unwrap_or_default(),
            dns,
            status: if up && addr.is_some() { "connected" } else { "disconnected" }.into(),
            ip_mode,
        })
    }

    fn scan_wifi(&mut self) -> Result<Vec<WifiNetwork>, String> {
        self.refresh();
        let mut list = self.state.wifi_scan.clone();
        list.sort_by(|a, b| b.in_use.cmp(&a.in_use).then(b.signal.cmp(&a.signal)));
        Ok(list)
    }

    fn connect_wifi(&mut self, ssid: &str, password: &str) -> Result<(), String> {
        let ssid = ssid.trim();
        if ssid.is_empty() {
            return Err("SSID cannot be empty".into());
        }
        let mut next = self.state.clone();
        match next.wifi_profiles.iter_mut().find(|p| p.ssid.trim() == ssid) {
            Some(p) => p.password = password.to_string(),
            None => next.wifi_profiles.push(WifiProfile {
                ssid: ssid.to_string(),
                password: password.to_string(),
            }),
        }
        for n in &mut next.wifi_scan {
            n.in_use = n.ssid == ssid;
        }
        self.commit(next)?;
        tracing::info!("WiFi profile saved for {ssid:?}");
        Ok(())
    }

    fn forget_wifi(&mut self, ssid: &str) -> Result<(), String> {
        let ssid = ssid.trim();
        if ssid.is_empty() {
            return Err("SSID cannot be empty".into());
        }
        let mut next = self.state.clone();
        next.wifi_profiles.retain(|p| p.ssid.trim() != ssid);
        for n in &mut next.wifi_scan {
            if n.ssid == ssid {
                n.in_use = false;
            }
        }
        self.commit(next)
    }

    fn saved_wifi(&self, ssid: &str) -> Option<String> {
        let ssid = ssid.trim();
        self.state
            .wifi_profiles
            .iter()
            .find(|p| p.ssid.trim() == ssid)
            .map(|p| p.password.clone())
    }

    fn apply_static_ip(
        &mut self,
        iface: &str,
        ip: &str,
        netmask: &str,
        gateway: &str,
        dns: &str,
    ) -> Result<(), String> {
        if ip.trim().is_empty() {
            return Err("IP cannot be empty".into());
        }
        let ip = parse_ipv4(ip)?;
        let mask = parse_netmask(if netmask.trim().is_empty() { "24" } else { netmask })?;
        let gateway = match gateway.trim() {
            "" => String::new(),
            g => parse_ipv4(g)?.to_string(),
        };
        let dns = match dns.trim() {
            "" => String::new(),
            d => parse_ipv4(d)?.to_string(),
        };
        let mut next = self.state.clone();
        next.ip = Some(IpSettings {
            interface: iface.to_string(),
            mode: "static".into(),
            ip: ip.to_string(),
            netmask: mask.to_string(),
            gateway,
            dns,
        });
        self.commit(next)?;
        tracing::info!("Static IP {ip}/{mask} requested on {iface}");
        Ok(())
    }

    fn apply_dhcp(&mut self, iface: &str, dns: &str) -> Result<(), String> {
        let dns = match dns.trim() {
            "" => String::new(),
            d => parse_ipv4(d)?.to_string(),
        };
        let mut next = self.state.clone();
        next.ip = Some(IpSettings {
            interface: iface.to_string(),
            mode: "dhcp".into(),
            dns,
            ..Default::default()
        });
        self.commit(next)?;
        tracing::info!("DHCP requested on {iface}");
        Ok(())
    }

    fn transfer_rate_kbps(&mut self, iface: &str) -> (f64, f64) {
        let iface = if iface.is_empty() {
            self.current_interface().unwrap_or_default()
        } else {
            iface.to_string()
        };
        self.sampler.sample(&iface)
    }

    fn tunnels(&mut self) -> Result<Vec<Tunnel>, String> {
        self.refresh();
        Ok(self.state.tunnels.clone())
    }

    fn add_tunnel(&mut self, tunnel: Tunnel) -> Result<(), String> {
        tunnel.validate()?;
        if self.state.tunnels.iter().any(|t| t.name == tunnel.name) {
            return Err(format!("Tunnel {} already exists", tunnel.name));
        }
        let name = tunnel.name.clone();
        let mut next = self.state.clone();
        next.tunnels.push(tunnel);
        self.commit(next)?;
        tracing::info!("Tunnel added: {name}");
        Ok(())
    }

    fn update_tunnel(&mut self, old_name: &str, tunnel: Tunnel) -> Result<(), String> {
        tunnel.validate()?;
        let Some(idx) = self.state.tunnels.iter().position(|t| t.name == old_name) else {
            return Err(format!("Tunnel {old_name} does not exist"));
        };
        if tunnel.name != old_name && self.state.tunnels.iter().any(|t| t.name == tunnel.name) {
            return Err(format!("Tunnel {} already exists", tunnel.name));
        }
        let name = tunnel.name.clone();
        let mut next = self.state.clone();
        next.tunnels[idx] = tunnel;
        self.commit(next)?;
        tracing::info!("Tunnel updated: {old_name} -> {name}");
        Ok(())
    }

    fn delete_tunnel(&mut self, name: &str) -> Result<(), String> {
        let mut next = self.state.clone();
        next.tunnels.retain(|t| t.name != name);
        if next.tunnels.len() == self.state.tunnels.len() {
            return Err(format!("Tunnel {name} does not exist"));
        }
        self.commit(next)?;
        tracing::info!("Tunnel deleted: {name}");
        Ok(())
    }

    fn tunnels_connected(&self) -> bool {
        self.state.tunnels_connected
    }
}

// ── test double ───────────────────────────────────────────────────────────────

/// In-memory facade for page and loop tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryServices {
    pub status: NetworkStatus,
    pub networks: Vec<WifiNetwork>,
    pub saved: HashMap<String, String>,
    pub tunnels: Vec<Tunnel>,
    pub connected: bool,
    pub fail_with: Option<String>,
    pub calls: Vec<String>,
}

#[cfg(test)]
impl MemoryServices {
    fn check(&mut self, call: String) -> Result<(), String> {
        self.calls.push(call);
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
impl Services for MemoryServices {
    fn network_status(&mut self) -> Result<NetworkStatus, String> {
        self.check("network_status".into())?;
        Ok(self.status.clone())
    }
    fn scan_wifi(&mut self) -> Result<Vec<WifiNetwork>, String> {
        self.check("scan_wifi".into())?;
        Ok(self.networks.clone())
    }
    fn connect_wifi(&mut self, ssid: &str, password: &str) -> Result<(), String> {
        self.check(format!("connect_wifi {ssid} {password}"))?;
        self.saved.insert(ssid.to_string(), password.to_string());
        Ok(())
    }
    fn forget_wifi(&mut self, ssid: &str) -> Result<(), String> {
        self.check(format!("forget_wifi {ssid}"))?;
        self.saved.remove(ssid);
        Ok(())
    }
    fn saved_wifi(&self, ssid: &str) -> Option<String> {
        self.saved.get(ssid).cloned()
    }
    fn apply_static_ip(&mut self, iface: &str, ip: &str, mask: &str, gw: &str, dns: &str) -> Result<(), String> {
        self.check(format!("static {iface} {ip} {mask} {gw} {dns}"))
    }
    fn apply_dhcp(&mut self, iface: &str, dns: &str) -> Result<(), String> {
        self.check(format!("dhcp {iface} {dns}"))
    }
    fn transfer_rate_kbps(&mut self, _iface: &str) -> (f64, f64) {
        (1.5, 12.25)
    }
    fn tunnels(&mut self) -> Result<Vec<Tunnel>, String> {
        self.check("tunnels".into())?;
        Ok(self.tunnels.clone())
    }
    fn add_tunnel(&mut self, t: Tunnel) -> Result<(), String> {
        self.check(format!("add_tunnel {}", t.name))?;
        t.validate()?;
        self.tunnels.push(t);
        Ok(())
    }
    fn update_tunnel(&mut self, old: &str, t: Tunnel) -> Result<(), String> {
        self.check(format!("update_tunnel {old} {}", t.name))?;
        t.validate()?;
        match self.tunnels.iter_mut().find(|x| x.name == old) {
            Some(x) => *x = t,
            None => return Err(format!("Tunnel {old} does not exist")),
        }
        Ok(())
    }
    fn delete_tunnel(&mut self, name: &str) -> Result<(), String> {
        self.check(format!("delete_tunnel {name}"))?;
        self.tunnels.retain(|t| t.name != name);
        Ok(())
    }
    fn tunnels_connected(&self) -> bool {
        self.connected
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
