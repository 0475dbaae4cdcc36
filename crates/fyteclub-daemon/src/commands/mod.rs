//! CLI command handlers, one module per command family (§6).

pub mod block;
pub mod group;

use crate::{DaemonContext, DaemonError, Result};

/// Parse and run one CLI invocation's argv (excluding argv[0]).
pub fn dispatch(ctx: &mut DaemonContext, args: &[String]) -> Result<()> {
    let now = fyteclub_types::now_unix();
    match args {
        [cmd, name] if cmd == "create" => {
            let group_id = group::create(ctx, name, now)?;
            println!("created syncshell {group_id} ({name})");
            Ok(())
        }
        [cmd, invite] if cmd == "join" => {
            let group_id = group::join(ctx, invite, now)?;
            println!("joined syncshell {group_id}");
            Ok(())
        }
        [cmd, group_id] if cmd == "leave" => {
            group::leave(ctx, group_id)?;
            println!("left syncshell {group_id}");
            Ok(())
        }
        [cmd] if cmd == "resync" => {
            let summary = group::resync(ctx, now)?;
            println!("{summary}");
            Ok(())
        }
        [cmd, peer_id] if cmd == "block" => {
            block::block(ctx, peer_id, now)?;
            println!("blocked {peer_id}");
            Ok(())
        }
        [cmd, peer_id] if cmd == "unblock" => {
            block::unblock(ctx, peer_id)?;
            println!("unblocked {peer_id}");
            Ok(())
        }
        [] => Err(DaemonError::InvalidArgument(
            "no command given; expected one of create, join, leave, resync, block, unblock".into(),
        )),
        other => Err(DaemonError::InvalidArgument(format!(
            "unrecognized command line: {}",
            other.join(" ")
        ))),
    }
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
    fn test_missing_command_is_invalid_argument() {
        let (mut ctx, _dir) = ctx();
        let err = dispatch(&mut ctx, &[]).expect_err("expected error");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unknown_command_is_invalid_argument() {
        let (mut ctx, _dir) = ctx();
        let err = dispatch(&mut ctx, &["frobnicate".to_string()]).expect_err("expected error");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_create_dispatches_to_group_create() {
        let (mut ctx, _dir) = ctx();
        dispatch(&mut ctx, &["create".to_string(), "Raid Team".to_string()]).expect("create");
        let rows = fyteclub_db::queries::syncshells::list(&ctx.conn).expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Raid Team");
    }
}
