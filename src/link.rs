//! Link I/O adapter (C7): binds the bridge's port indices to real network
//! interfaces via `pnet::datalink`. Modeled on this codebase's existing
//! single-process-per-switch style of one sender/receiver pair per bound
//! interface.
//!
//! The `LinkSend` trait lets the forwarding engine, STP engine, and BPDU
//! emitter send frames without knowing whether they're talking to real
//! interfaces or an in-memory test recorder.

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use pnet::datalink::{self, Channel::Ethernet, Config, DataLinkReceiver, DataLinkSender};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no interface named {0:?} found on this host")]
    InterfaceNotFound(String),
    #[error("interface {0:?} did not yield an Ethernet datalink channel")]
    NotEthernetChannel(String),
    #[error("interface {0:?} has no assigned MAC address")]
    NoMacAddress(String),
    #[error("failed to open datalink channel for {name:?}: {source}")]
    ChannelOpen {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Abstraction over "send this frame out this port", shared by the
/// forwarding engine (C4), STP engine (C5), and BPDU emitter (C6). `Send +
/// Sync` so one adapter can be shared between the data-plane thread (T1)
/// and the BPDU timer thread (T2).
pub trait LinkSend: Send + Sync {
    fn send_to_link(&self, port: usize, buf: &[u8]);
}

struct LinkPort {
    name: String,
    tx: Mutex<Box<dyn DataLinkSender>>,
}

/// The sending half, shared via `Arc` between T1 and T2.
pub struct PnetLinkAdapter {
    switch_mac: [u8; 6],
    ports: Vec<LinkPort>,
}

/// The receiving half. Exclusively owned by T1: `DataLinkReceiver` isn't
/// meant to be shared, and only the data-plane task ever calls
/// `recv_from_any_link`.
pub struct PnetReceivers {
    rx: Vec<Box<dyn DataLinkReceiver>>,
}

/// Binds one interface per entry of `link_args`, in order, so port index `i`
/// here lines up with port index `i` in the config-derived port table.
pub fn build(
    link_args: &[String],
    poll_timeout: Option<Duration>,
) -> Result<(PnetLinkAdapter, PnetReceivers), LinkError> {
    let interfaces = datalink::interfaces();
    let mut ports = Vec::with_capacity(link_args.len());
    let mut rx = Vec::with_capacity(link_args.len());
    let mut switch_mac: Option<[u8; 6]> = None;

    for name in link_args {
        let intf = interfaces
            .iter()
            .find(|i| &i.name == name)
            .ok_or_else(|| LinkError::InterfaceNotFound(name.clone()))?;

        let mac = intf
            .mac
            .ok_or_else(|| LinkError::NoMacAddress(name.clone()))?
            .octets();
        if switch_mac.is_none() {
            switch_mac = Some(mac);
        }

        let cfg = Config {
            read_timeout: poll_timeout,
            ..Config::default()
        };
        let channel = datalink::channel(intf, cfg).map_err(|source| LinkError::ChannelOpen {
            name: name.clone(),
            source,
        })?;
        let Ethernet(tx, port_rx) = channel else {
            return Err(LinkError::NotEthernetChannel(name.clone()));
        };

        ports.push(LinkPort {
            name: name.clone(),
            tx: Mutex::new(tx),
        });
        rx.push(port_rx);
    }

    let switch_mac = switch_mac.unwrap_or([0u8; 6]);
    Ok((
        PnetLinkAdapter { switch_mac, ports },
        PnetReceivers { rx },
    ))
}

impl PnetLinkAdapter {
    pub fn get_switch_mac(&self) -> [u8; 6] {
        self.switch_mac
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}

impl LinkSend for PnetLinkAdapter {
    fn send_to_link(&self, port: usize, buf: &[u8]) {
        let Some(link_port) = self.ports.get(port) else {
            warn!(port, "send_to_link: no such port");
            return;
        };
        let mut tx = link_port.tx.lock().unwrap();
        match tx.build_and_send(1, buf.len(), &mut |out| out.copy_from_slice(buf)) {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!(port, name = %link_port.name, error = %e, "send_to_link failed"),
            None => warn!(port, name = %link_port.name, "send_to_link: sender produced no packet"),
        }
    }
}

impl PnetReceivers {
    /// Blocks (bounded by each port's poll timeout) until a frame arrives on
    /// any bound interface, round-robining across ports so no interface is
    /// starved. Returns `Ok(None)` on a timeout with no data so the caller
    /// can re-check for shutdown between polls, matching the external
    /// contract's "blocks until a frame arrives" while still remaining
    /// responsive.
    pub fn recv_from_any_link(&mut self) -> io::Result<Option<(usize, Vec<u8>)>> {
        for (port, rx) in self.rx.iter_mut().enumerate() {
            match rx.next() {
                Ok(bytes) => return Ok(Some((port, bytes.to_vec()))),
                Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
