/// User interface module
///
/// - `stage.rs` - the framed design/overlay composite
/// - `controls.rs` - dimension, opacity and preset controls, URL bar
/// - `dropzone.rs` - drag-and-drop state for the stage
/// - `toast.rs` - transient notices

pub mod controls;
pub mod dropzone;
pub mod stage;
pub mod toast;
