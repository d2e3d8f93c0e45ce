//! Call session use case — the signaling-driven call state machine.
//!
//! Owns the [`CallPhase`] and the active [`EncodingPlan`], drives the SDP
//! codec-preference rewriter on every outgoing and incoming description,
//! triggers the encoding planner at the right phase transitions, and
//! emits/consumes signaling messages.
//!
//! All state lives behind a single `tokio::sync::Mutex`, which doubles as
//! the in-flight setup guard: a second "place call" or an incoming offer
//! cannot interleave mid-transition, and a hangup issued while setup is
//! pending waits for the pending operation to settle before tearing down.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::domain::call::{
    CallPhase, CaptureCapabilities, CaptureHints, IceCandidate, SessionDescription,
};
use crate::domain::encoding::{EncoderConfig, EncodingPlan, SvcRepresentation};
use crate::domain::signaling::SignalMsg;

use super::encoding_plan::{self, PlanRequest};
use super::error::CallError;
use super::ports::{AppEvents, MediaCapture, MediaEngine, SignalingChannel};
use super::sdp_prefer::{self, CodecPreference};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

struct SessionState {
    phase: CallPhase,
    /// Evidence of an acquired local stream, with its negotiated ranges.
    local_caps: Option<CaptureCapabilities>,
    /// User configuration; topology changes made mid-call are stored here
    /// and take effect at the next call setup.
    config: EncoderConfig,
    /// The plan most recently accepted by the engine, if any.
    live_plan: Option<EncodingPlan>,
    /// Once set, camera and layer-count changes are deferred to the next call.
    controls_locked: bool,
}

// ---------------------------------------------------------------------------
// Use case
// ---------------------------------------------------------------------------

pub struct CallSession {
    engine: Arc<dyn MediaEngine>,
    capture: Arc<dyn MediaCapture>,
    signaling: Arc<dyn SignalingChannel>,
    app_events: Arc<dyn AppEvents>,
    preference: CodecPreference,
    representation: SvcRepresentation,
    state: Mutex<SessionState>,
}

impl CallSession {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        capture: Arc<dyn MediaCapture>,
        signaling: Arc<dyn SignalingChannel>,
        app_events: Arc<dyn AppEvents>,
        preference: CodecPreference,
        representation: SvcRepresentation,
    ) -> Self {
        Self {
            engine,
            capture,
            signaling,
            app_events,
            preference,
            representation,
            state: Mutex::new(SessionState {
                phase: CallPhase::Idle,
                local_caps: None,
                config: EncoderConfig::default(),
                live_plan: None,
                controls_locked: false,
            }),
        }
    }

    pub async fn phase(&self) -> CallPhase {
        self.state.lock().await.phase
    }

    /// Acquire (or re-acquire) the local capture stream. Rejected while a
    /// call is in progress — camera changes are locked until the next call.
    pub async fn start_capture(
        &self,
        hints: CaptureHints,
    ) -> Result<CaptureCapabilities, CallError> {
        let mut state = self.state.lock().await;
        if state.controls_locked {
            return Err(CallError::Precondition(
                "capture settings are locked during a call",
            ));
        }
        let caps = match self.capture.acquire(&hints).await {
            Ok(caps) => caps,
            Err(e) => {
                warn!("local media acquisition failed: {e}");
                return Err(CallError::Precondition("local media unavailable"));
            }
        };
        info!(?caps, "local capture acquired");
        state.local_caps = Some(caps.clone());
        Ok(caps)
    }

    /// Store new encoder settings. Live calls only retune bitrate; layer
    /// topology changes are deferred to the next call setup.
    pub async fn update_encoder_config(&self, config: EncoderConfig) -> Result<(), CallError> {
        let mut state = self.state.lock().await;
        state.config = config;
        if !state.phase.is_in_call() {
            return Ok(());
        }
        // The running topology is frozen mid-call. When pre-call
        // configuration degraded and nothing was recorded, ask the engine
        // what is actually live before planning against it.
        let running = match &state.live_plan {
            Some(plan) => Some(plan.clone()),
            None => match self.engine.current_encoding().await {
                Ok(current) => current,
                Err(e) => {
                    warn!("could not read live encoder parameters: {e}");
                    None
                }
            },
        };
        let plan = encoding_plan::plan(
            running.as_ref(),
            &PlanRequest {
                config,
                representation: self.representation,
                is_active_call: true,
            },
        );
        let applied = encoding_plan::apply(self.engine.as_ref(), plan).await?;
        state.live_plan = Some(applied);
        Ok(())
    }

    // -- Placing a call (Idle -> Outgoing) ----------------------------------

    pub async fn place_call(&self) -> Result<(), CallError> {
        let mut state = self.state.lock().await;

        if state.phase.is_in_call() {
            return Err(CallError::Precondition("a call is already in progress"));
        }
        if !self.signaling.is_connected() {
            return Err(CallError::Precondition("signaling channel disconnected"));
        }
        if state.local_caps.is_none() {
            return Err(CallError::Precondition("no local media stream"));
        }
        state.phase = CallPhase::Idle;

        // Pre-call encoder configuration; layering may still be changed by
        // the user until the call goes active. Degradation here is never
        // fatal to call setup.
        self.configure_encoding(&mut state).await;

        let offer = match self.engine.create_offer().await {
            Ok(offer) => offer,
            Err(e) => return Err(self.negotiation_failure(&mut state, CallPhase::Idle, e).await),
        };
        let offer = self.rewrite(offer);

        if let Err(e) = self.engine.set_local_description(offer.clone()).await {
            return Err(self.negotiation_failure(&mut state, CallPhase::Idle, e).await);
        }

        if let Err(e) = self.signaling.send(SignalMsg::Offer { sdp: offer }).await {
            self.engine.close();
            state.live_plan = None;
            return Err(CallError::Transport(e));
        }

        state.phase = CallPhase::Outgoing;
        state.controls_locked = true;
        info!("offer sent, awaiting answer");
        self.app_events.phase_changed(CallPhase::Outgoing).await;
        Ok(())
    }

    // -- Signaling dispatch -------------------------------------------------

    /// Dispatch one inbound signaling message.
    pub async fn handle_signal(&self, msg: SignalMsg) -> Result<(), CallError> {
        debug!(msg_type = msg.type_name(), "handling signaling message");
        match msg {
            SignalMsg::Offer { sdp } => self.handle_offer(sdp).await,
            SignalMsg::Answer { sdp } => self.handle_answer(sdp).await,
            SignalMsg::IceCandidate { candidate } => self.handle_ice_candidate(candidate).await,
            SignalMsg::Hangup => self.handle_remote_hangup().await,
        }
    }

    /// Drain the inbound signaling queue until the channel closes. Errors
    /// from individual messages are reported and never stop the loop.
    pub async fn run(&self, rx: &mut mpsc::Receiver<SignalMsg>) {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = self.handle_signal(msg).await {
                warn!("signaling message handling failed: {e}");
            }
        }
        debug!("signaling queue closed, dispatcher exiting");
    }

    // -- Incoming offer (Idle -> Incoming -> Active) ------------------------

    async fn handle_offer(&self, remote: SessionDescription) -> Result<(), CallError> {
        let mut state = self.state.lock().await;

        if state.phase.is_in_call() {
            warn!(phase = ?state.phase, "ignoring offer received mid-call");
            return Ok(());
        }
        state.phase = CallPhase::Idle;

        // Auto-acquire local media for the incoming call; this may suspend
        // on a permission prompt.
        if state.local_caps.is_none() {
            match self.capture.acquire(&CaptureHints::auto()).await {
                Ok(caps) => state.local_caps = Some(caps),
                Err(e) => {
                    warn!("cannot answer, local media acquisition failed: {e}");
                    return Err(CallError::Precondition("local media unavailable"));
                }
            }
        }

        state.phase = CallPhase::Incoming;
        self.app_events.phase_changed(CallPhase::Incoming).await;

        // The remote offer goes through the same rewriter before being
        // accepted, so our answer negotiates the preferred codec first.
        let remote = self.rewrite(remote);
        if let Err(e) = self.engine.set_remote_description(remote).await {
            return Err(self.negotiation_failure(&mut state, CallPhase::Idle, e).await);
        }

        self.configure_encoding(&mut state).await;

        let answer = match self.engine.create_answer().await {
            Ok(answer) => answer,
            Err(e) => return Err(self.negotiation_failure(&mut state, CallPhase::Idle, e).await),
        };
        let answer = self.rewrite(answer);

        if let Err(e) = self.engine.set_local_description(answer.clone()).await {
            return Err(self.negotiation_failure(&mut state, CallPhase::Idle, e).await);
        }

        if let Err(e) = self.signaling.send(SignalMsg::Answer { sdp: answer }).await {
            self.engine.close();
            state.live_plan = None;
            state.phase = CallPhase::Idle;
            self.app_events.phase_changed(CallPhase::Idle).await;
            return Err(CallError::Transport(e));
        }

        // Answering completes negotiation immediately upon send.
        state.phase = CallPhase::Active;
        state.controls_locked = true;
        info!("answer sent, call active");
        self.app_events.phase_changed(CallPhase::Active).await;
        Ok(())
    }

    // -- Remote answer (Outgoing -> Active) ---------------------------------

    async fn handle_answer(&self, remote: SessionDescription) -> Result<(), CallError> {
        let mut state = self.state.lock().await;

        if state.phase != CallPhase::Outgoing {
            info!(phase = ?state.phase, "ignoring answer, not awaiting one");
            return Ok(());
        }

        let remote = self.rewrite(remote);
        if let Err(e) = self.engine.set_remote_description(remote).await {
            return Err(
                self.negotiation_failure(&mut state, CallPhase::Outgoing, e)
                    .await,
            );
        }

        state.phase = CallPhase::Active;
        state.controls_locked = true;
        info!("answer accepted, call active");
        self.app_events.phase_changed(CallPhase::Active).await;
        Ok(())
    }

    // -- ICE ----------------------------------------------------------------

    async fn handle_ice_candidate(&self, candidate: IceCandidate) -> Result<(), CallError> {
        let state = self.state.lock().await;
        if !state.phase.is_in_call() {
            debug!(phase = ?state.phase, "dropping ICE candidate outside a call");
            return Ok(());
        }
        // Forwarded opaquely; a rejected candidate is not fatal.
        if let Err(e) = self.engine.add_ice_candidate(candidate).await {
            warn!("engine rejected ICE candidate: {e}");
        }
        Ok(())
    }

    // -- Hangup -------------------------------------------------------------

    /// End the call. Idempotent: a no-op from `Idle` or `Ended`. Waits for
    /// any in-flight setup to settle before tearing down.
    pub async fn hangup(&self) -> Result<(), CallError> {
        let mut state = self.state.lock().await;
        if !state.phase.is_in_call() {
            debug!(phase = ?state.phase, "hangup is a no-op");
            return Ok(());
        }

        if let Err(e) = self.signaling.send(SignalMsg::Hangup).await {
            // The remote peer will notice the media path dying instead.
            warn!("could not notify remote peer of hangup: {e}");
        }
        self.teardown(&mut state).await;
        Ok(())
    }

    async fn handle_remote_hangup(&self) -> Result<(), CallError> {
        let mut state = self.state.lock().await;
        if !state.phase.is_in_call() {
            return Ok(());
        }
        info!("remote peer hung up");
        self.teardown(&mut state).await;
        Ok(())
    }

    async fn teardown(&self, state: &mut SessionState) {
        self.engine.close();
        state.live_plan = None;
        state.controls_locked = false;
        state.phase = CallPhase::Ended;
        info!("call ended");
        self.app_events.phase_changed(CallPhase::Ended).await;
    }

    // -- Helpers ------------------------------------------------------------

    fn rewrite(&self, desc: SessionDescription) -> SessionDescription {
        let supported = self.engine.video_codec_capabilities();
        SessionDescription {
            kind: desc.kind,
            sdp: sdp_prefer::rewrite(&desc.sdp, &supported, &self.preference),
        }
    }

    /// Plan and apply pre-call encoder parameters. Failures degrade per the
    /// planner's fallback chain and are reported via log only.
    async fn configure_encoding(&self, state: &mut SessionState) {
        let plan = encoding_plan::plan(
            state.live_plan.as_ref(),
            &PlanRequest {
                config: state.config,
                representation: self.representation,
                is_active_call: false,
            },
        );
        match encoding_plan::apply(self.engine.as_ref(), plan).await {
            Ok(applied) => state.live_plan = Some(applied),
            Err(e) => warn!("pre-call encoder configuration degraded: {e}"),
        }
    }

    /// Roll the phase back to its pre-attempt value and tear the peer
    /// connection down.
    async fn negotiation_failure(
        &self,
        state: &mut SessionState,
        rollback: CallPhase,
        cause: anyhow::Error,
    ) -> CallError {
        warn!(?rollback, "negotiation failed: {cause}");
        self.engine.close();
        state.live_plan = None;
        if state.phase != rollback {
            state.phase = rollback;
            self.app_events.phase_changed(rollback).await;
        }
        CallError::Negotiation(cause)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
