use std::io::Write;

/// Ask the user for a new password, twice, until both inputs match and the password is long
/// enough. The input is not echoed to the terminal.
pub fn query_new_password(min_length: usize) -> String {
    loop {
        let password = match rpassword::prompt_password("Enter new password: ") {
            Ok(password) => password,
            Err(e) => {
                println!("Error: {}", e);
                continue;
            }
        };
        if let Err(e) = check_password_length(&password, min_length) {
            println!("Error: {}", e);
            continue;
        }
        match rpassword::prompt_password("Repeat the password: ") {
            Ok(repeated) if repeated == password => return password,
            Ok(_) => println!("Error: The passwords don't match."),
            Err(e) => println!("Error: {}", e),
        }
    }
}

fn check_password_length(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        Err(format!(
            "Password must have at least {} characters",
            min_length
        ))
    } else {
        Ok(())
    }
}

/// Ask the user interactively for a boolean value in the terminal (entered as y/n). In case of an
/// error, the error is printed and the user is queried again and again with same prompt until the
/// entered value is parsed successfully.
pub fn query_user_bool(prompt: &str, default: Option<bool>) -> bool {
    let value_help = match default {
        Some(true) => "Y/n",
        Some(false) => "y/N",
        None => "y/n",
    };
    loop {
        println!("{} [{}]", prompt, value_help);
        print!("> ");
        let _ = std::io::stdout().flush();
        let mut user_input = String::new();
        if let Err(e) = std::io::stdin().read_line(&mut user_input) {
            println!("Error: {}", e);
            continue;
        }
        match user_input.trim().to_lowercase().as_str() {
            "y" => return true,
            "n" => return false,
            "" => {
                if let Some(default) = default {
                    return default;
                }
            }
            _ => {}
        }
        println!("Error: unknown option. Please enter 'y' or 'n'.");
    }
}
