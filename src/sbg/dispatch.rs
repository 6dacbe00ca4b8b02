use std::collections::HashMap;
use std::fmt::Debug;

use tracing::trace;

use super::logs::{
    AirData, EkfEuler, EkfNav, EkfQuat, GpsHdt, GpsPos, GpsVel, ImuData, ImuShort, SbgLog,
    UtcTime, DELTA_ANGLE_LSB, DELTA_VELOCITY_LSB, RAD_TO_DEG,
};
use super::{Message, SbgChannel, LOG_CLASS_ECOM_0};
use crate::decoder::Context;
use crate::Result;

type Handler = fn(&[u8], &mut Context<'_>) -> Result<()>;

/// Writes a decoded log to the session and channels.
trait Apply: SbgLog {
    fn apply(&self, ctx: &mut Context<'_>);
}

fn put(ctx: &mut Context<'_>, ch: SbgChannel, ts: u32, value: f64) {
    ctx.emit(ch.id(), ts, value);
}

fn put3(ctx: &mut Context<'_>, chs: [SbgChannel; 3], ts: u32, values: [f64; 3]) {
    for (ch, value) in chs.into_iter().zip(values) {
        put(ctx, ch, ts, value);
    }
}

impl Apply for UtcTime {
    fn apply(&self, ctx: &mut Context<'_>) {
        ctx.session.on_clock(
            self.timestamp,
            self.clock_valid(),
            &self.fields,
            ctx.store.metadata_mut(),
        );
    }
}

impl Apply for EkfNav {
    fn apply(&self, ctx: &mut Context<'_>) {
        let ts = self.timestamp;
        ctx.session
            .on_solution(ts, self.solution_valid(), ctx.store.metadata_mut());
        put3(
            ctx,
            [SbgChannel::Lat, SbgChannel::Lon, SbgChannel::Alt],
            ts,
            self.position,
        );
        put3(
            ctx,
            [SbgChannel::Vn, SbgChannel::Ve, SbgChannel::Vd],
            ts,
            self.velocity.map(f64::from),
        );
    }
}

impl Apply for EkfEuler {
    fn apply(&self, ctx: &mut Context<'_>) {
        put3(
            ctx,
            [SbgChannel::Roll, SbgChannel::Pitch, SbgChannel::Yaw],
            self.timestamp,
            self.euler.map(|v| f64::from(v) * RAD_TO_DEG),
        );
    }
}

impl Apply for EkfQuat {
    fn apply(&self, ctx: &mut Context<'_>) {
        let chs = [SbgChannel::Q0, SbgChannel::Q1, SbgChannel::Q2, SbgChannel::Q3];
        for (ch, value) in chs.into_iter().zip(self.quaternion) {
            put(ctx, ch, self.timestamp, f64::from(value));
        }
    }
}

impl Apply for ImuShort {
    fn apply(&self, ctx: &mut Context<'_>) {
        put3(
            ctx,
            [SbgChannel::DeltaVx, SbgChannel::DeltaVy, SbgChannel::DeltaVz],
            self.timestamp,
            self.delta_velocity.map(|v| f64::from(v) * DELTA_VELOCITY_LSB),
        );
        put3(
            ctx,
            [SbgChannel::DeltaAx, SbgChannel::DeltaAy, SbgChannel::DeltaAz],
            self.timestamp,
            self.delta_angle
                .map(|v| f64::from(v) * DELTA_ANGLE_LSB * RAD_TO_DEG),
        );
    }
}

impl Apply for ImuData {
    fn apply(&self, ctx: &mut Context<'_>) {
        let ts = self.timestamp;
        put3(
            ctx,
            [SbgChannel::AccelX, SbgChannel::AccelY, SbgChannel::AccelZ],
            ts,
            self.accel.map(f64::from),
        );
        put3(
            ctx,
            [SbgChannel::GyroX, SbgChannel::GyroY, SbgChannel::GyroZ],
            ts,
            self.gyro.map(|v| f64::from(v) * RAD_TO_DEG),
        );
        put(ctx, SbgChannel::ImuTemp, ts, f64::from(self.temperature));
    }
}

impl Apply for GpsVel {
    fn apply(&self, ctx: &mut Context<'_>) {
        put3(
            ctx,
            [SbgChannel::GnssVn, SbgChannel::GnssVe, SbgChannel::GnssVd],
            self.timestamp,
            self.velocity.map(f64::from),
        );
    }
}

impl Apply for GpsPos {
    fn apply(&self, ctx: &mut Context<'_>) {
        put3(
            ctx,
            [SbgChannel::GnssLat, SbgChannel::GnssLon, SbgChannel::GnssAlt],
            self.timestamp,
            [self.latitude, self.longitude, self.altitude],
        );
    }
}

impl Apply for GpsHdt {
    fn apply(&self, ctx: &mut Context<'_>) {
        put(ctx, SbgChannel::GnssHeading, self.timestamp, f64::from(self.heading));
        put(ctx, SbgChannel::GnssPitch, self.timestamp, f64::from(self.pitch));
    }
}

impl Apply for AirData {
    fn apply(&self, ctx: &mut Context<'_>) {
        put(ctx, SbgChannel::BaroAlt, self.timestamp, f64::from(self.altitude));
    }
}

fn route<L: Apply>(payload: &[u8], ctx: &mut Context<'_>) -> Result<()> {
    let log = L::decode(payload)?;
    ctx.session.observe(log.timestamp());
    log.apply(ctx);
    Ok(())
}

/// Routes class/id addressed messages to their log decoder.
///
/// The dispatcher holds nothing but its routing table; all state a log touches is
/// passed in through the [Context].
pub struct MessageDispatcher {
    routes: HashMap<(u8, u8), Handler>,
}

impl Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.routes.keys().collect();
        keys.sort();
        f.debug_struct("MessageDispatcher")
            .field("routes", &keys)
            .finish()
    }
}

impl Default for MessageDispatcher {
    fn default() -> Self {
        let mut dispatcher = MessageDispatcher {
            routes: HashMap::new(),
        };
        dispatcher.register::<UtcTime>();
        dispatcher.register::<ImuData>();
        dispatcher.register::<EkfEuler>();
        dispatcher.register::<EkfQuat>();
        dispatcher.register::<EkfNav>();
        dispatcher.register::<GpsVel>();
        dispatcher.register::<GpsPos>();
        dispatcher.register::<GpsHdt>();
        dispatcher.register::<AirData>();
        dispatcher.register::<ImuShort>();
        dispatcher
    }
}

impl MessageDispatcher {
    fn register<L: Apply>(&mut self) {
        self.routes.insert((LOG_CLASS_ECOM_0, L::ID as u8), route::<L>);
    }

    /// Decode `msg` into `ctx`. Returns false, without error, for messages that have
    /// no decoder.
    ///
    /// # Errors
    /// [crate::Error::NotEnoughData] if the payload is shorter than its log layout.
    pub fn dispatch(&self, msg: &Message<'_>, ctx: &mut Context<'_>) -> Result<bool> {
        let Some(handler) = self.routes.get(&(msg.class, msg.id)) else {
            trace!(class = msg.class, id = msg.id, "no decoder for message");
            return Ok(false);
        };
        handler(msg.payload, ctx)?;
        Ok(true)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
