//! Request services
//!
//! Connects the frame router to the motion engine and the response queue.
//! Every handler decodes its frame outside any critical section, takes the
//! engine lock only for the engine call, then encodes and queues at most
//! one response. Malformed frames are logged and dropped without a reply.
//!
//! The interrupt entry points ([`step_tick`], [`control_tick`],
//! [`emergency_stop`], [`on_transfer_complete`]) are free functions over the
//! shared cells so interrupt handlers do not need a [`Services`] value.

use steplink_hal::MotionHardware;
use steplink_protocol::messages::{
    AutoFriction, AutoFrictionAck, EncoderStatus, EncoderStatusReply, Home, HomeAck, LedControl,
    LedControlAck, Microsteps, MicrostepsAck, MoveEnd, MoveEndReason, MoveEndReply, MoveQueueAdd,
    MoveQueueAddAck, MoveQueueStatus, MoveQueueStatusReply, ProbeLevel, ProbeLevelReply,
    SetOrigin, SetOriginAck, StartMove, StartMoveAck,
};
use steplink_protocol::{
    AckStatus, Capture, FrameHandler, Message, MessageKind, ResponseQueue, Router, SpiLink,
    RESPONSE_QUEUE_DEPTH,
};

use crate::config::FrictionModel;
use crate::motion::{MotionEngine, MotionEvent, MoveSegment, MOVE_QUEUE_DEPTH};
use crate::shared::{with_shared, Shared};
use crate::traits::AuxServices;

/// Probe level reported when the probe cannot be read
pub const PROBE_LEVEL_UNAVAILABLE: u16 = u16::MAX;

/// Encode `msg` and queue it for the host
///
/// Encoding happens before the lock; only the bounded copy runs inside it.
fn respond<M: Message, const N: usize>(responses: &Shared<ResponseQueue<N>>, msg: &M) {
    let frame = match msg.encode_to_vec() {
        Ok(frame) => frame,
        Err(err) => {
            error!("failed to encode response {=u8:#x}: {}", M::TYPE, err);
            return;
        }
    };
    if let Err(err) = with_shared(responses, |queue| queue.push(&frame)) {
        warn!("response {=u8:#x} dropped: {}", M::TYPE, err);
    }
}

fn decode<M: Message>(frame: &[u8]) -> Option<M> {
    match M::decode(frame) {
        Ok(msg) => Some(msg),
        Err(err) => {
            warn!("dropping malformed {=u8:#x} frame ({} bytes): {}", M::TYPE, frame.len(), err);
            None
        }
    }
}

fn ack_status<E: Into<AckStatus>>(result: Result<(), E>) -> AckStatus {
    match result {
        Ok(()) => AckStatus::Ok,
        Err(err) => err.into(),
    }
}

/// Step tick entry point
///
/// A finished move queues a [`MoveEndReply`] with reason completed.
pub fn step_tick<H: MotionHardware, const Q: usize, const N: usize>(
    engine: &Shared<MotionEngine<H, Q>>,
    responses: &Shared<ResponseQueue<N>>,
) -> Option<MotionEvent> {
    let event = with_shared(engine, |engine| engine.tick_step());
    if let Some(MotionEvent::MoveCompleted { frame_id }) = event {
        respond(
            responses,
            &MoveEndReply {
                frame_id,
                reason: MoveEndReason::Completed,
            },
        );
    }
    event
}

/// Control tick entry point
pub fn control_tick<H: MotionHardware, const Q: usize>(engine: &Shared<MotionEngine<H, Q>>) {
    with_shared(engine, |engine| engine.tick_control());
}

/// Stop everything now, then tell the host
///
/// The drivers are disabled before this returns. The reply is queued while
/// the engine is still `Stopping`; `frame_id` tags it.
pub fn emergency_stop<H: MotionHardware, const Q: usize, const N: usize>(
    engine: &Shared<MotionEngine<H, Q>>,
    responses: &Shared<ResponseQueue<N>>,
    frame_id: u8,
) {
    with_shared(engine, |engine| {
        engine.emergency_stop_then(|_, reason| {
            respond(responses, &MoveEndReply { frame_id, reason })
        })
    });
}

/// SPI transfer-complete entry point
///
/// Captures the received buffer and primes the transmit buffer for the
/// next transfer.
pub fn on_transfer_complete<const RX: usize, const N: usize>(
    link: &Shared<SpiLink<RX>>,
    responses: &Shared<ResponseQueue<N>>,
    rx: &[u8],
    tx: &mut [u8],
) -> Capture {
    let capture = with_shared(link, |link| {
        with_shared(responses, |queue| link.on_transfer_complete(rx, tx, queue))
    });
    if let Capture::Overflow(reason) = capture {
        warn!("spi capture overflow: {}", reason);
    }
    capture
}

/// Request handlers bound to the shared engine and response queue
pub struct Services<
    'a,
    H,
    A,
    const Q: usize = MOVE_QUEUE_DEPTH,
    const N: usize = RESPONSE_QUEUE_DEPTH,
> {
    engine: &'a Shared<MotionEngine<H, Q>>,
    responses: &'a Shared<ResponseQueue<N>>,
    aux: A,
}

impl<'a, H, A, const Q: usize, const N: usize> Services<'a, H, A, Q, N>
where
    H: MotionHardware,
    A: AuxServices,
{
    pub fn new(
        engine: &'a Shared<MotionEngine<H, Q>>,
        responses: &'a Shared<ResponseQueue<N>>,
        aux: A,
    ) -> Self {
        Self {
            engine,
            responses,
            aux,
        }
    }

    pub fn aux(&self) -> &A {
        &self.aux
    }

    pub fn aux_mut(&mut self) -> &mut A {
        &mut self.aux
    }

    /// See [`step_tick`]
    pub fn step_tick(&self) -> Option<MotionEvent> {
        step_tick(self.engine, self.responses)
    }

    /// See [`control_tick`]
    pub fn control_tick(&self) {
        control_tick(self.engine)
    }

    /// See [`emergency_stop`]
    pub fn emergency_stop(&self, frame_id: u8) {
        emergency_stop(self.engine, self.responses, frame_id)
    }

    /// Drain captured transfers through `router`
    ///
    /// Returns the number of frames dispatched.
    pub fn poll<const RX: usize>(&mut self, link: &Shared<SpiLink<RX>>, router: &mut Router) -> usize {
        let mut dispatched = 0;
        while let Some(bytes) = with_shared(link, |link| link.take_frame()) {
            dispatched += router.feed(&bytes, self);
        }
        dispatched
    }

    fn reply<M: Message>(&self, msg: &M) {
        respond(self.responses, msg);
    }

    fn on_move_queue_add(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<MoveQueueAdd>(frame) else {
            return;
        };
        let segment = MoveSegment::from(&msg);
        let (result, depth) = with_shared(self.engine, |engine| {
            let result = engine.enqueue(segment).map(|_| ());
            (result, engine.queue_depth())
        });
        if let Err(err) = result {
            debug!("segment {} rejected: {}", msg.frame_id, err);
        }
        self.reply(&MoveQueueAddAck {
            frame_id: msg.frame_id,
            status: ack_status(result),
            queue_depth: depth.min(u8::MAX as usize) as u8,
        });
    }

    fn on_move_queue_status(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<MoveQueueStatus>(frame) else {
            return;
        };
        let status = with_shared(self.engine, |engine| engine.status());
        self.reply(&MoveQueueStatusReply {
            frame_id: msg.frame_id,
            state: status.state.code(),
            queue_depth: status.queue_depth,
            completion: status.completion,
            position_error: status.position_error,
        });
    }

    fn on_start_move(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<StartMove>(frame) else {
            return;
        };
        let result = with_shared(self.engine, |engine| engine.start());
        self.reply(&StartMoveAck::new(msg.frame_id, ack_status(result)));
    }

    fn on_move_end(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<MoveEnd>(frame) else {
            return;
        };
        let responses = self.responses;
        with_shared(self.engine, |engine| {
            engine.end_move_then(|_, reason| {
                respond(
                    responses,
                    &MoveEndReply {
                        frame_id: msg.frame_id,
                        reason,
                    },
                )
            })
        });
    }

    fn on_set_origin(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<SetOrigin>(frame) else {
            return;
        };
        let result = with_shared(self.engine, |engine| engine.set_origin(msg.axis_mask));
        self.reply(&SetOriginAck::new(msg.frame_id, ack_status(result)));
    }

    fn on_encoder_status(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<EncoderStatus>(frame) else {
            return;
        };
        let positions = with_shared(self.engine, |engine| engine.absolute_positions());
        self.reply(&EncoderStatusReply {
            frame_id: msg.frame_id,
            positions,
        });
    }

    fn on_led_control(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<LedControl>(frame) else {
            return;
        };
        let result = self.aux.set_led(msg.led, msg.mode);
        self.reply(&LedControlAck::new(msg.frame_id, ack_status(result)));
    }

    fn on_home(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<Home>(frame) else {
            return;
        };
        let status = if msg.axis_mask & 0x07 == 0 || msg.velocity == 0 {
            AckStatus::InvalidArgument
        } else if with_shared(self.engine, |engine| engine.state().is_moving()) {
            AckStatus::InvalidState
        } else {
            ack_status(
                self.aux
                    .start_homing(msg.axis_mask, msg.dir_mask, msg.velocity),
            )
        };
        self.reply(&HomeAck::new(msg.frame_id, status));
    }

    fn on_probe_level(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<ProbeLevel>(frame) else {
            return;
        };
        let level = self.aux.probe_level().unwrap_or_else(|err| {
            warn!("probe read failed: {}", err);
            PROBE_LEVEL_UNAVAILABLE
        });
        self.reply(&ProbeLevelReply {
            frame_id: msg.frame_id,
            level,
        });
    }

    fn on_microsteps(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<Microsteps>(frame) else {
            return;
        };
        let result = with_shared(self.engine, |engine| engine.set_microsteps(msg.microsteps));
        self.reply(&MicrostepsAck::new(msg.frame_id, ack_status(result)));
    }

    fn on_auto_friction(&mut self, frame: &[u8]) {
        let Some(msg) = decode::<AutoFriction>(frame) else {
            return;
        };
        let friction = msg
            .enable
            .then(|| FrictionModel::new(msg.coulomb_offset, msg.viscous_q8));
        with_shared(self.engine, |engine| engine.set_friction(friction));
        info!("friction model {}", if msg.enable { "on" } else { "off" });
        self.reply(&AutoFrictionAck::ok(msg.frame_id));
    }
}

impl<'a, H, A, const Q: usize, const N: usize> FrameHandler for Services<'a, H, A, Q, N>
where
    H: MotionHardware,
    A: AuxServices,
{
    fn handle(&mut self, kind: MessageKind, frame: &[u8]) {
        match kind {
            MessageKind::MoveQueueAdd => self.on_move_queue_add(frame),
            MessageKind::MoveQueueStatus => self.on_move_queue_status(frame),
            MessageKind::StartMove => self.on_start_move(frame),
            MessageKind::MoveEnd => self.on_move_end(frame),
            MessageKind::SetOrigin => self.on_set_origin(frame),
            MessageKind::EncoderStatus => self.on_encoder_status(frame),
            MessageKind::LedControl => self.on_led_control(frame),
            MessageKind::Home => self.on_home(frame),
            MessageKind::ProbeLevel => self.on_probe_level(frame),
            MessageKind::Microsteps => self.on_microsteps(frame),
            MessageKind::AutoFriction => self.on_auto_friction(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;
    use crate::error::AuxError;
    use crate::motion::mock::MockHardware;
    use crate::NoAux;
    use crate::motion::MotionState;
    use crate::shared::shared;
    use steplink_hal::AXIS_COUNT;
    use steplink_protocol::messages::{LedMode, PidGains};
    use steplink_protocol::{MASTER_POLL, STATUS_READY, TRANSFER_SIZE};

    type Engine = MotionEngine<MockHardware, 8>;

    fn engine() -> Shared<Engine> {
        let config = MotionConfig {
            encoder_counts_per_rev: [0; AXIS_COUNT],
            ..Default::default()
        };
        shared(MotionEngine::new(MockHardware::default(), config).unwrap())
    }

    fn add(frame_id: u8, steps: [u32; 3]) -> MoveQueueAdd {
        MoveQueueAdd {
            frame_id,
            dir_mask: 0,
            velocity: [2000; 3],
            steps,
            gains: [PidGains::default(); 3],
        }
    }

    fn pop(responses: &Shared<ResponseQueue<16>>) -> heapless::Vec<u8, 42> {
        with_shared(responses, |q| q.pop_frame()).expect("response queued")
    }

    fn send<M: Message, S: FrameHandler>(services: &mut S, kind: MessageKind, msg: &M) {
        let frame = msg.encode_to_vec().unwrap();
        services.handle(kind, &frame);
    }

    #[derive(Default)]
    struct FakeAux {
        led: Option<(u8, LedMode)>,
        homing: Option<(u8, u8, u16)>,
        probe: Option<u16>,
    }

    impl AuxServices for FakeAux {
        fn set_led(&mut self, led: u8, mode: LedMode) -> Result<(), AuxError> {
            self.led = Some((led, mode));
            Ok(())
        }

        fn start_homing(&mut self, axis_mask: u8, dir_mask: u8, velocity: u16) -> Result<(), AuxError> {
            self.homing = Some((axis_mask, dir_mask, velocity));
            Ok(())
        }

        fn probe_level(&mut self) -> Result<u16, AuxError> {
            self.probe.ok_or(AuxError::Busy)
        }
    }

    #[test]
    fn test_move_queue_add_acks_with_depth() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        send(&mut services, MessageKind::MoveQueueAdd, &add(1, [100, 0, 0]));
        send(&mut services, MessageKind::MoveQueueAdd, &add(2, [0, 100, 0]));

        let ack = MoveQueueAddAck::decode(&pop(&responses)).unwrap();
        assert_eq!((ack.frame_id, ack.status, ack.queue_depth), (1, AckStatus::Ok, 1));
        let ack = MoveQueueAddAck::decode(&pop(&responses)).unwrap();
        assert_eq!((ack.frame_id, ack.status, ack.queue_depth), (2, AckStatus::Ok, 2));
        assert_eq!(with_shared(&engine, |e| e.state()), MotionState::Queued);
    }

    #[test]
    fn test_move_queue_add_failure_still_acks() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        send(&mut services, MessageKind::MoveQueueAdd, &add(9, [0, 0, 0]));
        let ack = MoveQueueAddAck::decode(&pop(&responses)).unwrap();
        assert_eq!(ack.status, AckStatus::InvalidArgument);
        assert_eq!(ack.queue_depth, 0);

        for id in 0..8 {
            send(&mut services, MessageKind::MoveQueueAdd, &add(id, [1, 0, 0]));
            pop(&responses);
        }
        send(&mut services, MessageKind::MoveQueueAdd, &add(20, [1, 0, 0]));
        let ack = MoveQueueAddAck::decode(&pop(&responses)).unwrap();
        assert_eq!(ack.status, AckStatus::QueueFull);
        assert_eq!(ack.queue_depth, 8);
    }

    #[test]
    fn test_malformed_frame_dropped() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        let mut frame = add(1, [100, 0, 0]).encode_to_vec().unwrap();
        frame[40] ^= 0x01;
        services.handle(MessageKind::MoveQueueAdd, &frame);
        services.handle(MessageKind::StartMove, &frame[..3]);

        assert!(with_shared(&responses, |q| q.is_empty()));
        assert_eq!(with_shared(&engine, |e| e.queue_depth()), 0);
    }

    #[test]
    fn test_start_with_nothing_queued() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        send(&mut services, MessageKind::StartMove, &StartMove { frame_id: 4 });
        let ack = StartMoveAck::decode(&pop(&responses)).unwrap();
        assert_eq!(ack, StartMoveAck::new(4, AckStatus::InvalidState));
    }

    #[test]
    fn test_status_reports_running() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        send(&mut services, MessageKind::MoveQueueAdd, &add(1, [100, 0, 0]));
        send(&mut services, MessageKind::MoveQueueAdd, &add(2, [100, 0, 0]));
        send(&mut services, MessageKind::StartMove, &StartMove { frame_id: 3 });
        send(&mut services, MessageKind::MoveQueueStatus, &MoveQueueStatus { frame_id: 4 });

        pop(&responses);
        pop(&responses);
        assert!(StartMoveAck::decode(&pop(&responses)).unwrap().status.is_ok());
        let reply = MoveQueueStatusReply::decode(&pop(&responses)).unwrap();
        assert_eq!(reply.frame_id, 4);
        assert_eq!(reply.state, MotionState::Running.code());
        assert_eq!(reply.queue_depth, 1);
    }

    #[test]
    fn test_move_end_replies_stopped() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        send(&mut services, MessageKind::MoveQueueAdd, &add(1, [100, 0, 0]));
        send(&mut services, MessageKind::StartMove, &StartMove { frame_id: 2 });
        send(&mut services, MessageKind::MoveEnd, &MoveEnd { frame_id: 3 });
        pop(&responses);
        pop(&responses);

        let reply = MoveEndReply::decode(&pop(&responses)).unwrap();
        assert_eq!(reply.reason, MoveEndReason::Stopped);
        assert_eq!(with_shared(&engine, |e| e.state()), MotionState::Idle);
    }

    #[test]
    fn test_step_tick_reports_completion() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        send(&mut services, MessageKind::MoveQueueAdd, &add(7, [5, 0, 0]));
        send(&mut services, MessageKind::StartMove, &StartMove { frame_id: 8 });
        pop(&responses);
        pop(&responses);

        let mut event = None;
        for tick in 0..200_000u32 {
            if tick % 50 == 0 {
                services.control_tick();
            }
            event = services.step_tick();
            if event.is_some() {
                break;
            }
        }
        assert_eq!(event, Some(MotionEvent::MoveCompleted { frame_id: 7 }));
        let reply = MoveEndReply::decode(&pop(&responses)).unwrap();
        assert_eq!(
            reply,
            MoveEndReply {
                frame_id: 7,
                reason: MoveEndReason::Completed
            }
        );
    }

    #[test]
    fn test_emergency_stop_replies() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let services = Services::new(&engine, &responses, NoAux);

        services.emergency_stop(0x42);
        let reply = MoveEndReply::decode(&pop(&responses)).unwrap();
        assert_eq!(reply.frame_id, 0x42);
        assert_eq!(reply.reason, MoveEndReason::EmergencyStop);
        assert_eq!(with_shared(&engine, |e| e.hardware().enabled), [false; 3]);
    }

    #[test]
    fn test_set_origin_and_encoder_status() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        with_shared(&engine, |e| e.hardware_mut().encoder = [0, 0, 0]);
        services.control_tick();
        with_shared(&engine, |e| e.hardware_mut().encoder = [250, 0, 0]);
        services.control_tick();

        send(&mut services, MessageKind::SetOrigin, &SetOrigin { frame_id: 1, axis_mask: 0x01 });
        send(&mut services, MessageKind::SetOrigin, &SetOrigin { frame_id: 2, axis_mask: 0 });
        send(&mut services, MessageKind::EncoderStatus, &EncoderStatus { frame_id: 3 });

        assert!(SetOriginAck::decode(&pop(&responses)).unwrap().status.is_ok());
        assert_eq!(
            SetOriginAck::decode(&pop(&responses)).unwrap().status,
            AckStatus::InvalidArgument
        );
        let reply = EncoderStatusReply::decode(&pop(&responses)).unwrap();
        assert_eq!(reply.positions, [250, 0, 0]);
    }

    #[test]
    fn test_no_aux_rejects_peripherals() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        send(
            &mut services,
            MessageKind::LedControl,
            &LedControl { frame_id: 1, led: 0, mode: LedMode::On },
        );
        send(&mut services, MessageKind::ProbeLevel, &ProbeLevel { frame_id: 2 });

        assert_eq!(
            LedControlAck::decode(&pop(&responses)).unwrap().status,
            AckStatus::Rejected
        );
        let reply = ProbeLevelReply::decode(&pop(&responses)).unwrap();
        assert_eq!(reply.level, PROBE_LEVEL_UNAVAILABLE);
    }

    #[test]
    fn test_aux_requests_forwarded() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let aux = FakeAux {
            probe: Some(512),
            ..Default::default()
        };
        let mut services = Services::new(&engine, &responses, aux);

        send(
            &mut services,
            MessageKind::LedControl,
            &LedControl { frame_id: 1, led: 2, mode: LedMode::Blink },
        );
        send(
            &mut services,
            MessageKind::Home,
            &Home { frame_id: 2, axis_mask: 0x03, dir_mask: 0x01, velocity: 800 },
        );
        send(&mut services, MessageKind::ProbeLevel, &ProbeLevel { frame_id: 3 });

        assert!(LedControlAck::decode(&pop(&responses)).unwrap().status.is_ok());
        assert!(HomeAck::decode(&pop(&responses)).unwrap().status.is_ok());
        assert_eq!(ProbeLevelReply::decode(&pop(&responses)).unwrap().level, 512);
        assert_eq!(services.aux().led, Some((2, LedMode::Blink)));
        assert_eq!(services.aux().homing, Some((0x03, 0x01, 800)));
    }

    #[test]
    fn test_home_preconditions() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, FakeAux::default());

        send(
            &mut services,
            MessageKind::Home,
            &Home { frame_id: 1, axis_mask: 0, dir_mask: 0, velocity: 800 },
        );
        assert_eq!(
            HomeAck::decode(&pop(&responses)).unwrap().status,
            AckStatus::InvalidArgument
        );

        send(&mut services, MessageKind::MoveQueueAdd, &add(2, [1000, 0, 0]));
        send(&mut services, MessageKind::StartMove, &StartMove { frame_id: 3 });
        pop(&responses);
        pop(&responses);
        send(
            &mut services,
            MessageKind::Home,
            &Home { frame_id: 4, axis_mask: 0x01, dir_mask: 0, velocity: 800 },
        );
        assert_eq!(
            HomeAck::decode(&pop(&responses)).unwrap().status,
            AckStatus::InvalidState
        );
        assert_eq!(services.aux().homing, None);
    }

    #[test]
    fn test_tuning_requests() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let mut services = Services::new(&engine, &responses, NoAux);

        send(&mut services, MessageKind::Microsteps, &Microsteps { frame_id: 1, microsteps: 32 });
        send(&mut services, MessageKind::Microsteps, &Microsteps { frame_id: 2, microsteps: 12 });
        send(
            &mut services,
            MessageKind::AutoFriction,
            &AutoFriction { frame_id: 3, enable: true, coulomb_offset: 120, viscous_q8: 16 },
        );

        assert!(MicrostepsAck::decode(&pop(&responses)).unwrap().status.is_ok());
        assert_eq!(
            MicrostepsAck::decode(&pop(&responses)).unwrap().status,
            AckStatus::InvalidArgument
        );
        assert!(AutoFrictionAck::decode(&pop(&responses)).unwrap().status.is_ok());
        assert_eq!(with_shared(&engine, |e| e.config().microsteps), 32);
        assert_eq!(
            with_shared(&engine, |e| e.friction()),
            Some(FrictionModel::new(120, 16))
        );

        send(
            &mut services,
            MessageKind::AutoFriction,
            &AutoFriction { frame_id: 4, enable: false, coulomb_offset: 0, viscous_q8: 0 },
        );
        pop(&responses);
        assert_eq!(with_shared(&engine, |e| e.friction()), None);
    }

    #[test]
    fn test_transfer_to_response_round_trip() {
        let engine = engine();
        let responses = shared(ResponseQueue::<16>::new());
        let link = shared(SpiLink::<4>::new());
        let mut router = Router::new();
        let mut services = Services::new(&engine, &responses, NoAux);

        let mut rx = [0u8; TRANSFER_SIZE];
        let mut tx = [0u8; TRANSFER_SIZE];
        let request = StartMove { frame_id: 0x21 }.encode_to_vec().unwrap();
        rx[..request.len()].copy_from_slice(&request);

        assert_eq!(on_transfer_complete(&link, &responses, &rx, &mut tx), Capture::Frame);
        assert_eq!(tx, [STATUS_READY; TRANSFER_SIZE]);
        assert_eq!(services.poll(&link, &mut router), 1);

        // The next poll transfer carries the ack
        let poll = [MASTER_POLL; TRANSFER_SIZE];
        assert_eq!(on_transfer_complete(&link, &responses, &poll, &mut tx), Capture::Poll);
        let ack = StartMoveAck::decode(&tx[..StartMoveAck::LEN]).unwrap();
        assert_eq!(ack, StartMoveAck::new(0x21, AckStatus::InvalidState));
        assert!(tx[StartMoveAck::LEN..].iter().all(|&b| b == STATUS_READY));
    }
}
