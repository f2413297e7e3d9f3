use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::{ConfigError, GameConfig},
    dungeon::{MapError, MapLayout},
    maze::MazeGenerator,
    session::{GamePhase, GameSession, PlayerInput, Snapshot},
};

/// Failure to build or rebuild a game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Supplies a map whenever a session is (re)built.
pub trait MapSource {
    fn fetch(&mut self) -> Result<MapLayout, MapError>;
}

/// Always returns the same layout.
#[derive(Debug, Clone)]
pub struct FixedMap(pub MapLayout);

impl MapSource for FixedMap {
    fn fetch(&mut self) -> Result<MapLayout, MapError> {
        Ok(self.0.clone())
    }
}

impl<R: Rng> MapSource for MazeGenerator<R> {
    fn fetch(&mut self) -> Result<MapLayout, MapError> {
        self.next_layout()
    }
}

/// The driver-facing game: the current session plus the controls that sit
/// outside the gameplay loop.
pub struct Game {
    config: GameConfig,
    source: Box<dyn MapSource>,
    rng: StdRng,
    session: GameSession,
}

impl Game {
    /// Validates `config`, fetches the first map and starts a session.
    pub fn new(config: GameConfig, mut source: Box<dyn MapSource>) -> Result<Self, GameError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let layout = source.fetch()?;
        let session = GameSession::new(&layout, &config, StdRng::from_rng(&mut rng))?;
        Ok(Game {
            config,
            source,
            rng,
            session,
        })
    }

    /// Advances the current session by one tick.
    pub fn tick(&mut self, input: PlayerInput) -> Snapshot {
        self.session.tick(input)
    }

    /// Throws the current session away and builds a new one from a freshly
    /// fetched map. On failure the old session is kept.
    pub fn request_reset(&mut self) -> Result<(), GameError> {
        let layout = self.source.fetch()?;
        let session = GameSession::new(&layout, &self.config, StdRng::from_rng(&mut self.rng))?;
        let cheating = self.session.is_cheating();
        self.session = session;
        if cheating {
            self.session.set_cheat(true);
        }
        tracing::info!("game reset");
        Ok(())
    }

    /// Toggles cheat mode on the current session.
    pub fn set_cheat(&mut self, enabled: bool) {
        self.session.set_cheat(enabled);
    }

    /// Phase of the current session.
    pub fn phase(&self) -> GamePhase {
        self.session.phase()
    }

    /// The running session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// The validated config every session is built from.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}
