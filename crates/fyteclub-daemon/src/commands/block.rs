//! `block` and `unblock` (§6). Blocking is process-local, not group-scoped.

use fyteclub_db::queries::block_list;

use crate::{DaemonContext, DaemonError, Result};

pub fn block(ctx: &DaemonContext, peer_id: &str, now: u64) -> Result<()> {
    if peer_id.trim().is_empty() {
        return Err(DaemonError::InvalidArgument("peer id must not be empty".into()));
    }
    block_list::block(&ctx.conn, peer_id, now)?;
    Ok(())
}

pub fn unblock(ctx: &DaemonContext, peer_id: &str) -> Result<()> {
    if !block_list::is_blocked(&ctx.conn, peer_id)? {
        return Err(DaemonError::NotFound(format!("{peer_id} is not blocked")));
    }
    block_list::unblock(&ctx.conn, peer_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> (DaemonContext, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = DaemonContext::bootstrap(dir.path().to_path_buf(), fyteclub_types::DEFAULT_STORE_CAPACITY_BYTES)
            .expect("bootstrap");
        (ctx, dir)
    }

    #[test]
    fn test_block_then_unblock_roundtrip() {
        let (ctx, _dir) = ctx();
        block(&ctx, "mallory", 100).expect("block");
        assert!(block_list::is_blocked(&ctx.conn, "mallory").expect("check"));
        unblock(&ctx, "mallory").expect("unblock");
        assert!(!block_list::is_blocked(&ctx.conn, "mallory").expect("check"));
    }

    #[test]
    fn test_unblock_unknown_peer_is_not_found() {
        let (ctx, _dir) = ctx();
        let err = unblock(&ctx, "nobody").expect_err("expected error");
        assert!(matches!(err, DaemonError::NotFound(_)));
    }

    #[test]
    fn test_block_rejects_empty_peer_id() {
        let (ctx, _dir) = ctx();
        let err = block(&ctx, "", 100).expect_err("expected error");
        assert!(matches!(err, DaemonError::InvalidArgument(_)));
    }
}
