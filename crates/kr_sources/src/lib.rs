pub mod cli;
pub mod collector;
pub mod logging;
pub mod manager;
pub mod pacing;
pub mod sources;

pub use cli::{handle_command, CommandContext, ResearchArgs, ResearchCommands, Sources};
pub use collector::SerpCollector;
pub use logging::{init_logging, Logger};
pub use manager::Researcher;
pub use pacing::{FixedSpacing, Pacer, Unpaced};
pub use sources::{DataForSeoClient, DataForSeoCredentials, DataForSeoKeywordSource, DataForSeoSerpSource, FixtureSource};

pub mod prelude {
    pub use super::pacing::Pacer;
    pub use super::Researcher;
    pub use kr_core::{Error, KeywordSource, Result, SerpSource};
}
