// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

/// Renders the inspection-only `restore.sh` companion script written
/// alongside a session's on-disk state (§6.5). Supports `list`, `status`,
/// `latest`, and `<state_id>` subcommands; it never applies a diff, only
/// prints state contents.
pub fn render_script(session_id: &str) -> String {
    format!(
        r#"#!/bin/sh
# restore.sh for session {session_id}
# Inspects recorded states. Does not apply any diff.
set -eu

cd "$(dirname "$0")"

cmd="${{1:-status}}"

case "$cmd" in
  list)
    ls states/*.state 2>/dev/null | sed -e 's#states/##' -e 's#\.state$##'
    ;;
  status)
    if [ -f flow.code ]; then
      printf 'flow: '
      cat flow.code
      printf '\n'
    fi
    ls states/*.state 2>/dev/null | wc -l | awk '{{print $1 " state(s) recorded"}}'
    ;;
  latest)
    latest=$(ls states/*.state 2>/dev/null | sort | tail -n 1)
    if [ -z "$latest" ]; then
      echo "no states recorded" >&2
      exit 1
    fi
    cat "$latest"
    ;;
  *)
    state_file="states/$cmd.state"
    if [ ! -f "$state_file" ]; then
      echo "unknown state: $cmd" >&2
      exit 1
    fi
    cat "$state_file"
    ;;
esac
"#
    )
}
