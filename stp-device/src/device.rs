use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use rand::rngs::OsRng;
use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tracing::{debug, info, instrument, warn};

use stp_crypto::{SessionSecrets, TransportParameters};
use stp_dataplane::Dataplane;
use stp_handshake::{run_initiator, run_responder};
use stp_record::{RecordHeader, HEADER_LEN};
use stp_rekey::{complete_rekey, incoming_request_wins, respond_to_rekey, RekeyContext, RekeyTrigger};
use stp_routing::{parse_destination, Peer, PeerSet, PeerSpec, RouteEntry};
use stp_wire::{DataPacket, FrameFlag, RekeyWireMessage};

use crate::config::ValidatedConfig;
use crate::error::DeviceError;
use crate::phase::Phase;
use crate::session::Session;
use crate::state::{DeviceState, PeerStats};

/// How long a pending rekey may sit unanswered before the connection is
/// treated as failed and torn down (§4.4 failure mode).
const REKEY_GRACE_WINDOW: Duration = Duration::from_secs(30);

/// How often the timer loop wakes to check the keepalive deadline. Checking
/// more often than the keepalive interval itself would ever require just
/// wastes a wakeup; this is a coarse poll, not a precise scheduler.
const KEEPALIVE_POLL_INTERVAL: Duration = Duration::from_secs(1);

fn now_millis() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

fn build_routes(peers: &[PeerSpec]) -> Vec<RouteEntry> {
    peers
        .iter()
        .flat_map(|peer| {
            let name = peer.name.clone();
            peer.allowed_prefixes.iter().map(move |prefix| RouteEntry { prefix: *prefix, peer_name: name.clone() })
        })
        .collect()
}

/// A single established tunnel connection (§4.7): owns the transport stream,
/// the live cipher state, the peer/route table, and the timers that drive
/// keepalive and rekey. One `Device` per TCP connection; a process that
/// terminates many tunnels runs one per accepted/dialed stream.
pub struct Device<S, D> {
    reader: AsyncMutex<ReadHalf<S>>,
    writer: AsyncMutex<WriteHalf<S>>,
    dataplane: Arc<D>,

    session: Session,

    peer_set: RwLock<Arc<PeerSet>>,
    phase: RwLock<Phase>,
    session_id: RwLock<[u8; 16]>,
    pending_rekey: AsyncMutex<Option<RekeyContext>>,

    role_is_initiator: bool,
    transport_params: TransportParameters,
    rekey_interval: Duration,
    rekey_budget: u64,

    last_send_millis: AtomicI64,
    path_confirmed: AtomicBool,
    stop: Notify,

    /// DATA frames sent under the current epoch, for the byte/message rekey
    /// budget (§4.4) — deliberately separate from `session.send_counter()`,
    /// which also counts BIND/KEEPALIVE/REKEY frames. Reset to 0 on swap.
    data_sent: AtomicU64,
    /// Woken whenever a pending rekey resolves, so a paused `outbound_pump`
    /// can recheck.
    rekey_idle: Notify,
}

impl<S, D> Device<S, D>
where
    S: AsyncRead + AsyncWrite + Unpin,
    D: Dataplane,
{
    /// Dial out: run the initiator side of the handshake over `stream`, then
    /// build a `Device` ready for [`Device::run`].
    #[instrument(skip_all)]
    pub async fn connect(mut stream: S, config: ValidatedConfig, dataplane: Arc<D>) -> Result<Self, DeviceError> {
        let mut rng = OsRng;
        let (secrets, params) = run_initiator(&mut stream, config.psk.clone(), &mut rng).await?;
        info!(session_id = %hex::encode(secrets.session_id), "handshake complete (initiator)");
        Self::from_established(stream, secrets, params, true, config, dataplane)
    }

    /// Accept an inbound connection: run the responder side of the handshake
    /// over `stream`, then build a `Device` ready for [`Device::run`].
    #[instrument(skip_all)]
    pub async fn accept(mut stream: S, config: ValidatedConfig, dataplane: Arc<D>) -> Result<Self, DeviceError> {
        let mut rng = OsRng;
        let params = config.transport_params;
        let secrets = run_responder(&mut stream, config.psk.clone(), params, &mut rng).await?;
        info!(session_id = %hex::encode(secrets.session_id), "handshake complete (responder)");
        Self::from_established(stream, secrets, params, false, config, dataplane)
    }

    fn from_established(
        stream: S,
        secrets: SessionSecrets,
        transport_params: TransportParameters,
        role_is_initiator: bool,
        config: ValidatedConfig,
        dataplane: Arc<D>,
    ) -> Result<Self, DeviceError> {
        let (reader, writer) = split(stream);
        let session_id = secrets.session_id;
        let session = Session::new(secrets, transport_params.max_padding);
        let routes = build_routes(&config.peers);
        let peer_set = PeerSet::build(config.peers, routes, &PeerSet::empty());
        let now = now_millis();
        for peer in peer_set.iter() {
            peer.record_handshake(now);
        }

        Ok(Device {
            reader: AsyncMutex::new(reader),
            writer: AsyncMutex::new(writer),
            dataplane,
            session,
            peer_set: RwLock::new(Arc::new(peer_set)),
            phase: RwLock::new(Phase::Established),
            session_id: RwLock::new(session_id),
            pending_rekey: AsyncMutex::new(None),
            role_is_initiator,
            transport_params,
            rekey_interval: config.rekey_interval,
            rekey_budget: config.rekey_budget,
            last_send_millis: AtomicI64::new(now),
            path_confirmed: AtomicBool::new(false),
            stop: Notify::new(),
            data_sent: AtomicU64::new(0),
            rekey_idle: Notify::new(),
        })
    }

    /// Drive this connection until the peer closes it, the transport errors,
    /// or [`Device::close`] is called: the outbound pump, the receive loop,
    /// and the keepalive/rekey timers all run concurrently until one of them
    /// finishes (§4.7).
    pub async fn run(&self) -> Result<(), DeviceError> {
        self.send_frame(FrameFlag::BIND, &[]).await?;
        debug!("sent path-confirmation BIND frame");

        tokio::select! {
            res = self.outbound_pump() => res,
            res = self.receive_loop() => res,
            res = self.timer_loop() => res,
        }
    }

    /// Signal every loop in [`Device::run`] to stop and release the
    /// dataplane. Idempotent.
    pub async fn close(&self) {
        *self.phase.write() = Phase::Closing;
        self.stop.notify_waiters();
        self.dataplane.close().await;
        *self.phase.write() = Phase::Closed;
    }

    /// Swap in a freshly validated peer/route table, preserving statistics
    /// for any peer name that survives the reload (P9).
    pub fn reload_peers(&self, peers: Vec<PeerSpec>) {
        let routes = build_routes(&peers);
        let mut guard = self.peer_set.write();
        let next = PeerSet::build(peers, routes, &guard);
        *guard = Arc::new(next);
    }

    /// A point-in-time view of connection and peer state, for anything that
    /// wants to observe this device without touching its internals (§3's
    /// runtime reflection surface).
    pub async fn snapshot(&self) -> DeviceState {
        let send_counter = self.session.send_counter().await;
        let peers = self.peer_set.read().iter().map(|peer| PeerStats::from(peer.as_ref())).collect();
        DeviceState {
            phase: (*self.phase.read()).into(),
            session_epoch: self.session.epoch(),
            send_counter,
            peers,
        }
    }

    async fn send_frame(&self, flags: FrameFlag, payload: &[u8]) -> Result<(), DeviceError> {
        let record = self.session.seal(flags, payload).await?;
        let mut writer = self.writer.lock().await;
        writer.write_all(&record).await?;
        self.last_send_millis.store(now_millis(), Ordering::Relaxed);
        Ok(())
    }

    async fn read_record(&self) -> std::io::Result<Vec<u8>> {
        let mut reader = self.reader.lock().await;
        let mut header_buf = [0u8; HEADER_LEN];
        reader.read_exact(&mut header_buf).await?;
        let header = RecordHeader::decode(&header_buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        let mut body = vec![0u8; header.length as usize];
        reader.read_exact(&mut body).await?;
        let mut record = Vec::with_capacity(HEADER_LEN + body.len());
        record.extend_from_slice(&header_buf);
        record.extend_from_slice(&body);
        Ok(record)
    }

    fn resolve_peer_name(&self, explicit: Option<&str>, payload: &[u8]) -> Option<String> {
        if let Some(name) = explicit {
            return Some(name.to_string());
        }
        let destination = parse_destination(payload).ok()?;
        self.peer_set.read().router().lookup(destination).ok().map(str::to_owned)
    }

    fn peer_by_name(&self, name: &str) -> Option<Arc<Peer>> {
        self.peer_set.read().get(name)
    }

    /// Pull locally-originated payloads from the dataplane, resolve each to
    /// a peer by explicit name or IP route (§4.5), and seal/send a DATA
    /// frame. Payloads that match no peer are dropped.
    async fn outbound_pump(&self) -> Result<(), DeviceError> {
        loop {
            let next = tokio::select! {
                _ = self.stop.notified() => return Ok(()),
                next = self.dataplane.next_outbound() => next,
            };
            let (explicit_name, payload) = match next {
                Some(v) => v,
                None => return Ok(()),
            };

            let resolved = self.resolve_peer_name(explicit_name.as_deref(), &payload);
            let Some(resolved) = resolved else {
                warn!("dropping outbound payload: no explicit peer and no route match");
                continue;
            };

            // Hold DATA frames while a rekey is in flight (P6): sealing one
            // under the old epoch after the peer has already swapped both
            // directions would arrive at an already-advanced RecvState and
            // fail AEAD, opening a gap in the counter stream.
            loop {
                let idle = self.rekey_idle.notified();
                if self.pending_rekey.lock().await.is_none() {
                    break;
                }
                tokio::select! {
                    _ = self.stop.notified() => return Ok(()),
                    _ = idle => {}
                }
            }

            let packet = DataPacket { peer_name: explicit_name, payload };
            self.send_frame(FrameFlag::DATA, &packet.encode()).await?;
            self.data_sent.fetch_add(1, Ordering::Relaxed);

            if let Some(peer) = self.peer_by_name(&resolved) {
                peer.record_send(now_millis());
            }

            self.maybe_trigger_rekey(RekeyTrigger::Bytes).await?;
        }
    }

    /// Read records off the transport, open each under the current epoch,
    /// and dispatch by frame flag (§4.3, §4.4, §4.8).
    async fn receive_loop(&self) -> Result<(), DeviceError> {
        loop {
            let record = tokio::select! {
                _ = self.stop.notified() => return Ok(()),
                result = self.read_record() => result,
            };
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    debug!(error = %e, "transport closed, ending receive loop");
                    return Ok(());
                }
            };

            let opened = self.session.open(&record).await;
            match opened {
                Ok((flags, payload, _counter)) => self.handle_frame(flags, payload).await?,
                Err(stp_record::RecordError::Replay) => warn!("dropped replayed record"),
                Err(e) => warn!(error = %e, "dropped malformed record"),
            }
        }
    }

    async fn handle_frame(&self, flags: FrameFlag, payload: Vec<u8>) -> Result<(), DeviceError> {
        if flags == FrameFlag::DATA {
            let packet = DataPacket::decode(&payload)?;
            let resolved = self.resolve_peer_name(packet.peer_name.as_deref(), &packet.payload);
            if let Some(name) = &resolved {
                if let Some(peer) = self.peer_by_name(name) {
                    peer.record_receive(now_millis());
                }
            }
            if let Err(e) = self.dataplane.deliver(resolved.as_deref(), &packet.payload).await {
                warn!(error = %e, "dataplane rejected inbound payload");
            }
        } else if flags == FrameFlag::KEEPALIVE {
            // empty payload, nothing to do beyond having advanced the replay window
        } else if flags == FrameFlag::REKEY {
            self.handle_rekey_frame(&payload).await?;
        } else if flags == FrameFlag::BIND {
            self.path_confirmed.store(true, Ordering::Relaxed);
            debug!("peer path confirmed");
        }
        Ok(())
    }

    async fn handle_rekey_frame(&self, payload: &[u8]) -> Result<(), DeviceError> {
        let message = RekeyWireMessage::decode(payload)?;
        match message {
            RekeyWireMessage::Request(request) => {
                let mut pending = self.pending_rekey.lock().await;
                if pending.is_some() && !incoming_request_wins(self.role_is_initiator) {
                    debug!("discarding inbound rekey request: a local rekey is already pending and wins the tie");
                    return Ok(());
                }
                *pending = None;
                drop(pending);

                let old_session_id = *self.session_id.read();
                let (response, secrets) = respond_to_rekey(&request, old_session_id, &mut OsRng)?;
                let new_session_id = secrets.session_id;
                let new_epoch = secrets.epoch;
                self.send_frame(FrameFlag::REKEY, &RekeyWireMessage::Response(response).encode()).await?;
                self.session.swap(secrets, self.transport_params.max_padding).await;
                *self.session_id.write() = new_session_id;
                self.data_sent.store(0, Ordering::Relaxed);
                for peer in self.peer_set.read().iter() {
                    peer.set_rekey_epoch(new_epoch);
                }
                self.rekey_idle.notify_waiters();
                info!(epoch = new_epoch, "completed rekey as responder");
            }
            RekeyWireMessage::Response(response) => {
                let ctx = self.pending_rekey.lock().await.take();
                let Some(ctx) = ctx else {
                    warn!("rekey response with no pending request, ignoring");
                    return Ok(());
                };
                let old_session_id = *self.session_id.read();
                let secrets = complete_rekey(&ctx, &response, old_session_id)?;
                let new_session_id = secrets.session_id;
                let new_epoch = secrets.epoch;
                self.session.swap(secrets, self.transport_params.max_padding).await;
                *self.session_id.write() = new_session_id;
                self.data_sent.store(0, Ordering::Relaxed);
                for peer in self.peer_set.read().iter() {
                    peer.set_rekey_epoch(new_epoch);
                }
                self.rekey_idle.notify_waiters();
                info!(epoch = new_epoch, "completed rekey as initiator");
            }
        }
        Ok(())
    }

    /// Keepalive and rekey timers (§3, §4.4): send a KEEPALIVE once
    /// `transport_params.keepalive` has elapsed with nothing sent, initiate
    /// a rekey on `rekey_interval`, and close the connection if a rekey
    /// fails to complete within its grace window.
    async fn timer_loop(&self) -> Result<(), DeviceError> {
        let mut keepalive_ticker = tokio::time::interval(KEEPALIVE_POLL_INTERVAL);
        let mut rekey_ticker = tokio::time::interval(self.rekey_interval);
        rekey_ticker.tick().await; // interval fires immediately; skip the instant first rekey

        loop {
            tokio::select! {
                _ = self.stop.notified() => return Ok(()),
                _ = keepalive_ticker.tick() => {
                    let idle = now_millis() - self.last_send_millis.load(Ordering::Relaxed);
                    if idle >= self.transport_params.keepalive.as_millis() as i64 {
                        self.send_frame(FrameFlag::KEEPALIVE, &[]).await?;
                    }
                    self.check_rekey_grace().await?;
                }
                _ = rekey_ticker.tick() => {
                    self.maybe_trigger_rekey(RekeyTrigger::Time).await?;
                }
            }
        }
    }

    async fn maybe_trigger_rekey(&self, trigger: RekeyTrigger) -> Result<(), DeviceError> {
        if trigger == RekeyTrigger::Bytes {
            let sent = self.data_sent.load(Ordering::Relaxed);
            if sent < self.rekey_budget {
                return Ok(());
            }
        }

        let mut pending = self.pending_rekey.lock().await;
        if pending.is_some() {
            return Ok(());
        }
        let current_epoch = self.session.epoch();
        let (ctx, request) = RekeyContext::initiate(current_epoch, &mut OsRng);
        *pending = Some(ctx);
        drop(pending);

        debug!(%trigger, "initiating rekey");
        self.send_frame(FrameFlag::REKEY, &RekeyWireMessage::Request(request).encode()).await
    }

    async fn check_rekey_grace(&self) -> Result<(), DeviceError> {
        let pending = self.pending_rekey.lock().await;
        if let Some(ctx) = pending.as_ref() {
            if ctx.is_stale(REKEY_GRACE_WINDOW) {
                return Err(DeviceError::RekeyGraceExpired(REKEY_GRACE_WINDOW));
            }
        }
        Ok(())
    }
}
