//! `fastdl check` – dry-run the download policy on relative paths.

use anyhow::Result;
use fastdl_core::validate::validate;

/// Prints a verdict per path; fails if any path would be refused.
pub fn run_check(paths: &[String]) -> Result<()> {
    let mut rejected = 0usize;
    for path in paths {
        match validate(path) {
            Ok(()) => println!("ok        {}", path),
            Err(reason) => {
                rejected += 1;
                println!("rejected  {}: {}", path, reason);
            }
        }
    }
    if rejected > 0 {
        anyhow::bail!("{} of {} path(s) rejected", rejected, paths.len());
    }
    Ok(())
}
