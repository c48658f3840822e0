// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod controller;
pub mod ids;
pub mod model;
pub mod splice;
pub mod state;

pub use controller::*;
pub use ids::*;
pub use model::*;
pub use splice::*;
pub use state::*;
