//! Host loop around the fixed-timestep tick
//!
//! Accumulates real frame time into fixed steps, clears one-shot inputs,
//! drains events, saves progression when a tier completes and publishes
//! multiplayer snapshots. The progression load is polled, never awaited:
//! the run starts on defaults and is rebuilt once saved progress arrives.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::error::SimError;
use crate::persistence::{LoadPoll, PendingLoad, Progress, ProgressStore};
use crate::settings::Settings;
use crate::sim::controller::xp_threshold;
use crate::sim::snapshot::{PlayerSnapshot, RemotePlayers, RenderView, SnapshotPublisher, render_view};
use crate::sim::{GameState, SimContext, SimEvent, TickInput, tick};
use crate::tuning::GameData;

pub struct Session<S: ProgressStore> {
    data: GameData,
    settings: Settings,
    state: GameState,
    seed: u64,
    accumulator: f32,
    input: TickInput,
    store: S,
    pending: Option<PendingLoad>,
    progress: Progress,
    publisher: SnapshotPublisher,
    outbox: Vec<PlayerSnapshot>,
    remote: RemotePlayers,
}

impl<S: ProgressStore> Session<S> {
    pub fn new(data: GameData, settings: Settings, store: S, pending: PendingLoad, seed: u64) -> Result<Self, SimError> {
        data.validate()?;
        let progress = Progress {
            character: settings.character.clone(),
            ..Progress::default()
        };
        let state = GameState::new(&SimContext::new(&data, &settings), seed, progress.tier, &progress.character)?;
        let publisher = SnapshotPublisher::new(settings.snapshot_rate);
        Ok(Self {
            data,
            settings,
            state,
            seed,
            accumulator: 0.0,
            input: TickInput::default(),
            store,
            pending: Some(pending),
            progress,
            publisher,
            outbox: Vec::new(),
            remote: RemotePlayers::new(),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Input for the next fixed step; one-shot flags clear after it runs
    pub fn input_mut(&mut self) -> &mut TickInput {
        &mut self.input
    }

    pub fn render_view(&self) -> RenderView {
        render_view(&self.state)
    }

    pub fn loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Run simulation ticks for `frame_dt` seconds of real time and return
    /// the events they raised
    pub fn update(&mut self, frame_dt: f32) -> Vec<SimEvent> {
        self.poll_load();

        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let ctx = SimContext::new(&self.data, &self.settings);
            tick(&mut self.state, &ctx, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.jump = false;
            self.input.pause = false;
            self.input.upgrade = None;

            let drained = self.state.drain_events();
            for event in &drained {
                if let SimEvent::TierCompleted { next, .. } = event {
                    self.save_progress(*next);
                }
            }
            events.extend(drained);

            if let Some(snapshot) = self.publisher.poll(SIM_DT, &self.state) {
                self.outbox.push(snapshot);
            }
        }
        // Drop backlog the substep cap could not absorb
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        events
    }

    /// Snapshots published since the last call, for the transport
    pub fn take_snapshots(&mut self) -> Vec<PlayerSnapshot> {
        std::mem::take(&mut self.outbox)
    }

    /// Feed a peer's snapshot bytes; malformed or stale records are dropped
    pub fn receive_snapshot(&mut self, peer: u32, bytes: &[u8]) -> bool {
        match PlayerSnapshot::from_bytes(bytes) {
            Some(snapshot) => self.remote.accept(peer, snapshot),
            None => {
                log::debug!("malformed snapshot from peer {peer} ({} bytes)", bytes.len());
                false
            }
        }
    }

    pub fn remote_players(&self) -> &RemotePlayers {
        &self.remote
    }

    /// Start a fresh run from the current progression
    pub fn restart(&mut self, seed: u64) -> Result<(), SimError> {
        self.seed = seed;
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<(), SimError> {
        let ctx = SimContext::new(&self.data, &self.settings);
        let mut state = GameState::new(&ctx, self.seed, self.progress.tier, &self.progress.character)?;

        let progress = &self.progress;
        let player = &mut state.player;
        if let Some(stats) = progress.stats {
            player.stats = stats;
        }
        if let Some(max) = progress.max_health.filter(|h| *h > 0.0) {
            player.max_health = max;
            player.health = max;
        }
        if !progress.weapons.is_empty() {
            player.weapons = progress.weapons.clone();
        }
        player.level = progress.level.max(1);
        player.xp_to_next = xp_threshold(player.level, &self.data.tunables.combat);
        player.currency = progress.currency;
        self.state = state;
        self.accumulator = 0.0;
        self.input = TickInput::default();
        Ok(())
    }

    fn poll_load(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let LoadPoll::Ready(loaded) = pending.poll() else {
            return;
        };
        self.pending = None;
        let Some(progress) = loaded else {
            log::info!("no saved progress, keeping fresh run");
            return;
        };

        log::info!("saved progress arrived: tier {} ({})", progress.tier, progress.character);
        self.progress = progress;
        if let Err(err) = self.rebuild() {
            log::warn!("could not start from saved progress ({err}), keeping fresh run");
        }
    }

    fn save_progress(&mut self, next_tier: u32) {
        let player = &self.state.player;
        self.progress.tier = next_tier;
        self.progress.best_tier = self.progress.best_tier.max(next_tier);
        self.progress.stats = Some(player.stats);
        self.progress.max_health = Some(player.max_health);
        self.progress.weapons = player.weapons.clone();
        self.progress.level = player.level;
        self.progress.currency = player.currency;
        if let Err(err) = self.store.save(&self.progress) {
            log::warn!("failed to save progress: {err}");
        }
    }
}
