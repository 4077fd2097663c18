mod config;
mod input;
mod sink;
mod stats;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use cs2d::net::{DEFAULT_CLIENT_PORT, DEFAULT_SERVER_PORT};
use cs2d::{
    ClientSession, InterpolationConfig, PacketLossSimulation, PlayerInput, ReliabilityConfig,
    SimulatedChannel, UdpChannel,
};

use config::ClientConfig;
use input::InputState;
use sink::LoggingSink;
use stats::TickStats;

// Ticks spent flushing the disconnect request before the socket closes.
const SHUTDOWN_TICKS: u32 = 10;

#[derive(Parser)]
#[command(name = "cs2d-client")]
#[command(about = "Headless cs2d client: connects, interpolates snapshots, sends input")]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1", help = "Server IP address")]
    server: String,

    #[arg(long, default_value_t = DEFAULT_SERVER_PORT)]
    server_port: u16,

    #[arg(long, default_value_t = DEFAULT_CLIENT_PORT)]
    local_port: u16,

    #[arg(short, long, default_value_t = 0)]
    player_id: i32,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, help = "Wait instead of connecting on startup")]
    no_connect: bool,

    #[arg(long, default_value = "", help = "Keys held every tick, e.g. \"up,right,shoot\"")]
    input: String,

    #[arg(long, help = "Run for this many seconds, then disconnect")]
    duration: Option<f64>,

    #[arg(long, default_value_t = 3, help = "Snapshots to keep buffered")]
    buffer_length: usize,

    #[arg(long, default_value_t = 0.5, help = "Seconds of lag before playback resyncs")]
    max_lag: f64,

    #[arg(long, default_value_t = 1, help = "Builds between max-wait resends")]
    resend_interval: u32,

    #[arg(long, help = "Enable inbound packet loss simulation")]
    simulate_packet_loss: bool,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 0, help = "Minimum latency in ms")]
    min_latency: u32,

    #[arg(long, default_value_t = 0, help = "Maximum latency in ms")]
    max_latency: u32,

    #[arg(long, default_value_t = 0, help = "Jitter in ms")]
    jitter: u32,
}

impl Args {
    fn into_config(self) -> Result<ClientConfig> {
        let packet_loss = self.simulate_packet_loss.then(|| PacketLossSimulation {
            enabled: true,
            loss_percent: self.loss_percent,
            min_latency_ms: self.min_latency,
            max_latency_ms: self.max_latency,
            jitter_ms: self.jitter,
        });

        Ok(ClientConfig {
            server_ip: self.server,
            server_port: self.server_port,
            local_port: self.local_port,
            player_id: self.player_id,
            tick_rate: self.tick_rate,
            auto_connect: !self.no_connect,
            input: InputState::parse(&self.input)?,
            duration_secs: self.duration,
            interpolation: InterpolationConfig {
                desired_buffer_length: self.buffer_length,
                max_snapshot_lag: self.max_lag,
                ..Default::default()
            },
            reliability: ReliabilityConfig {
                resend_interval: self.resend_interval,
                ..Default::default()
            },
            packet_loss,
            ..Default::default()
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;

    let udp = UdpChannel::open(&config.server_ip, config.local_port, config.server_port)?;
    log::info!("bound {} talking to {}", udp.local_addr(), udp.remote_addr());

    let channel = SimulatedChannel::new(udp, config.packet_loss.clone().unwrap_or_default());
    let mut session = ClientSession::new(config.session_config(), channel, LoggingSink::new());

    if config.auto_connect {
        session.request_connect();
    }

    run(&config, &mut session)?;

    log::info!("shutting down");
    session.request_disconnect();
    for _ in 0..SHUTDOWN_TICKS {
        session.advance(config.tick_seconds(), PlayerInput::empty())?;
        thread::sleep(Duration::from_secs_f64(config.tick_seconds()));
    }
    session.close();

    Ok(())
}

fn run(
    config: &ClientConfig,
    session: &mut ClientSession<SimulatedChannel<UdpChannel>, LoggingSink>,
) -> Result<()> {
    let tick = Duration::from_secs_f64(config.tick_seconds());
    let input = config.input.to_input();
    let start = Instant::now();
    let mut last_tick = start;
    let mut last_report = start;
    let mut stats = TickStats::new();

    loop {
        let now = Instant::now();
        if config
            .duration_secs
            .is_some_and(|limit| now.duration_since(start).as_secs_f64() >= limit)
        {
            return Ok(());
        }

        let delta_time = now.duration_since(last_tick).as_secs_f64();
        last_tick = now;

        session.advance(delta_time, input)?;
        stats.record_tick();

        if now.duration_since(last_report).as_secs_f64() >= config.stats_interval_secs {
            last_report = now;
            report(session, &stats);
        }

        let elapsed = now.elapsed();
        if elapsed < tick {
            thread::sleep(tick - elapsed);
        }
    }
}

fn report(session: &ClientSession<SimulatedChannel<UdpChannel>, LoggingSink>, stats: &TickStats) {
    let buffer = session.snapshots().debug_stats();
    let net = session.channel().inner().stats();

    log::info!(
        "connected={} players={} tick_rate={:.1} buffer={} sim_time={:.3} speed={:.3} resyncs={}",
        session.is_connected(),
        session.sink().len(),
        stats.tick_rate(),
        buffer.buffer_size,
        buffer.simulation_time,
        buffer.playback_speed,
        buffer.resyncs
    );
    log::debug!(
        "sent={}/{}B received={}/{}B simulated_drops={} pending_acks={}",
        net.packets_sent,
        net.bytes_sent,
        net.packets_received,
        net.bytes_received,
        session.channel().dropped(),
        session.manager().pending_count()
    );
    for (player_id, position) in session.sink().positions() {
        log::debug!("  player {} at ({:.2}, {:.2})", player_id, position.x, position.y);
    }
}
