mod integration_repl;
