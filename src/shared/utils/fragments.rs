use futures::{Stream, TryStreamExt};

/// Drain a lazy sequence of text fragments into one string.
///
/// Fragments are appended in arrival order, without trimming or
/// de-duplication. The first error ends the drain and is returned.
pub async fn drain_fragments<S, E>(fragments: S) -> Result<String, E>
where
    S: Stream<Item = Result<String, E>>,
{
    fragments
        .try_fold(String::new(), |mut acc, fragment| async move {
            acc.push_str(&fragment);
            Ok(acc)
        })
        .await
}
