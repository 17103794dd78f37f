use std::net::IpAddr;
use std::thread;
use std::time::{Duration, Instant};

use mdns_sd::{ServiceDaemon, ServiceEvent};
use thiserror::Error;

/// Service type VRChat advertises its OSCQuery endpoint under.
const OSCQUERY_SERVICE: &str = "_oscjson._tcp.local.";

/// How long one lookup drains mDNS responses before reporting no match.
const POLL_WINDOW: Duration = Duration::from_millis(1500);

/// A discovered OSCQuery service: where its HTTP side can be reached.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    pub name: String,
    pub address: IpAddr,
    pub port: u16,
    pub transport: String,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("mDNS daemon error: {0}")]
    Daemon(#[from] mdns_sd::Error),
}

/// One-shot lookup of a named service. `Ok(None)` means nothing matched
/// within the lookup's own time window.
pub trait ServiceFinder {
    fn find_service_by_name(&self, name: &str) -> Result<Option<ServiceHandle>, DiscoveryError>;
}

/// mDNS-backed finder browsing the `_oscjson._tcp` service type.
pub struct MdnsBrowser {
    daemon: ServiceDaemon,
    window: Duration,
}

impl MdnsBrowser {
    pub fn new() -> Result<MdnsBrowser, DiscoveryError> {
        Ok(MdnsBrowser {
            daemon: ServiceDaemon::new()?,
            window: POLL_WINDOW,
        })
    }
}

impl ServiceFinder for MdnsBrowser {
    fn find_service_by_name(&self, name: &str) -> Result<Option<ServiceHandle>, DiscoveryError> {
        let receiver = self.daemon.browse(OSCQUERY_SERVICE)?;
        let deadline = Instant::now() + self.window;
        let mut found = None;

        while found.is_none() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match receiver.recv_timeout(deadline - now) {
                Ok(ServiceEvent::ServiceResolved(info)) => {
                    // VRChat shows up as e.g. "VRChat-Client-ABC123._oscjson._tcp.local."
                    if !info.get_fullname().contains(name) {
                        continue;
                    }
                    // Prefer IPv4; VRChat binds its OSC side on the v4 stack.
                    let address = info
                        .get_addresses()
                        .iter()
                        .find(|addr| addr.is_ipv4())
                        .or_else(|| info.get_addresses().iter().next())
                        .copied();
                    if let Some(address) = address {
                        found = Some(ServiceHandle {
                            name: instance_name(info.get_fullname()),
                            address,
                            port: info.get_port(),
                            transport: "TCP".to_string(),
                        });
                    }
                }
                Ok(_) => continue,
                // Window elapsed without a match.
                Err(_) => break,
            }
        }

        let _ = self.daemon.stop_browse(OSCQUERY_SERVICE);
        Ok(found)
    }
}

/// Strip the service-type suffix from an mDNS fullname.
fn instance_name(fullname: &str) -> String {
    match fullname.find("._oscjson") {
        Some(idx) => fullname[..idx].to_string(),
        None => fullname.to_string(),
    }
}

/// Poll `finder` for a named service a fixed number of times. The first
/// match wins; sleeping happens only between attempts, so the worst case
/// blocks for `(tries - 1) * delay`. A finder fault consumes its attempt and
/// the loop keeps going. A zero `tries` from config still polls once.
pub fn find_service(
    finder: &dyn ServiceFinder,
    name: &str,
    tries: u32,
    delay: Duration,
) -> Option<ServiceHandle> {
    let tries = tries.max(1);
    for attempt in 1..=tries {
        match finder.find_service_by_name(name) {
            Ok(Some(service)) => return Some(service),
            Ok(None) => {
                if crate::is_debug_enabled() {
                    println!("[mDNS] attempt {}/{}: no {} service yet", attempt, tries, name);
                }
            }
            Err(err) => {
                eprintln!("[mDNS] attempt {}/{} failed: {}", attempt, tries, err);
            }
        }
        if attempt < tries {
            thread::sleep(delay);
        }
    }
    None
}
