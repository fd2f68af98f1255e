use crate::layer::{EnvLayer, LayerError, read_layer};
use camino::Utf8Path;

/// Where environment layers come from.
///
/// The compose fixup reads layers through this so it can be tested against in-memory layers.
pub trait LayerSource {
    fn read_layer(&self, path: &Utf8Path) -> Result<EnvLayer, LayerError>;
}

/// File-system backed `LayerSource`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLayerSource;

impl LayerSource for FsLayerSource {
    fn read_layer(&self, path: &Utf8Path) -> Result<EnvLayer, LayerError> {
        read_layer(path)
    }
}
