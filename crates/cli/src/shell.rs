//! The shell-integration script emitted by `-S`. A static string: the
//! binary never inspects the caller's shell, it just prints something the
//! caller is expected to `eval` (e.g. from `.zshrc`: `eval "$(zsql -S)"`).

pub const INTEGRATION_SCRIPT: &str = r#"# zsql shell integration. Eval this from your shell's startup file:
#   eval "$(zsql -S)"

_zsql_record_dir() {
    command zsql -a "$(pwd)" >/dev/null 2>&1 &
}

if [ -n "$ZSH_VERSION" ]; then
    autoload -Uz add-zsh-hook 2>/dev/null && add-zsh-hook precmd _zsql_record_dir
elif [ -n "$BASH_VERSION" ]; then
    case "$PROMPT_COMMAND" in
        *_zsql_record_dir*) ;;
        *) PROMPT_COMMAND="_zsql_record_dir${PROMPT_COMMAND:+; $PROMPT_COMMAND}" ;;
    esac
fi

z() {
    local arg
    for arg in "$@"; do
        case "$arg" in
            -*[afS]*)
                # -a, -f, -S (and any getopt cluster containing one of
                # them): these do not print a path to cd into, so just run
                # the binary through and let it talk to the terminal.
                command zsql "$@"
                return
                ;;
        esac
    done

    if [ "$#" -eq 0 ]; then
        builtin cd "$HOME" || return
        return
    fi
    if [ "$#" -eq 1 ] && [ "$1" = "-" ]; then
        builtin cd - || return
        return
    fi

    local dest
    dest=$(command zsql "$@") || return
    builtin cd "${dest%?}" || return
}

zi() {
    z -i "$@"
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_defines_the_z_function() {
        assert!(INTEGRATION_SCRIPT.contains("z() {"));
    }

    #[test]
    fn script_invokes_the_binary_by_name() {
        assert!(INTEGRATION_SCRIPT.contains("command zsql"));
    }

    #[test]
    fn script_registers_a_post_prompt_hook_that_adds_the_current_directory() {
        assert!(INTEGRATION_SCRIPT.contains("command zsql -a"));
        assert!(INTEGRATION_SCRIPT.contains("precmd"));
        assert!(INTEGRATION_SCRIPT.contains("PROMPT_COMMAND"));
    }

    #[test]
    fn script_strips_the_trailing_sentinel_before_cding() {
        assert!(INTEGRATION_SCRIPT.contains(r#"cd "${dest%?}""#));
    }

    #[test]
    fn script_passes_non_search_flags_through_without_cding() {
        assert!(INTEGRATION_SCRIPT.contains("-*[afS]*"));
    }
}
