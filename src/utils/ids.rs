use nanoid::nanoid;

/// Generate a 21-character url-safe unique identifier.
///
/// Used for minting linkage ids and execution record ids.
pub fn longid() -> String {
    nanoid!()
}
