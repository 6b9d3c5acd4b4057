/// Marker for a model that is **not yet trained**.
///
/// Used as a type parameter (`LogisticModel<Unfitted>`) so that training
/// methods are only available before fitting and `predict` only after.
#[derive(Clone, Copy, Debug)]
pub struct Unfitted;

/// Marker for a **trained** model.
///
/// A `Fitted` model holds only inference parameters: no optimizer state,
/// loss function or training hyperparameters.
#[derive(Clone, Copy, Debug)]
pub struct Fitted;
