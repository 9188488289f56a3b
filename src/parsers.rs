use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_till, take_until},
    character::complete::char,
    sequence::{delimited, preceded},
};

/// Parses a double quoted string, which may be empty
pub fn parse_between_double_quotes(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c: char| c == '"'), char('"')).parse(input)
}

pub fn parse_not_double_quote(input: &str) -> IResult<&str, &str> {
    take_till(|c: char| c == '"').parse(input)
}

/// For parsing up to the next occurence of a desired (double quoted) key
pub fn parse_until_key<'a>(file_content: &'a str, key: &str) -> IResult<&'a str, &'a str> {
    let quoted_key = format!("\"{key}\"");

    take_until(quoted_key.as_str()).parse(file_content)
}

/// For general parsing of text KeyValues (and JSON) files, finds the next occurence of a given key
/// and returns the double quoted value which follows it
pub fn parse_value_json<'a>(file_content: &'a str, key: &str) -> IResult<&'a str, String> {
    let quoted_key = format!("\"{key}\"");

    let (file_content, _) = parse_until_key(file_content, key)?;
    let (file_content, _) = tag(quoted_key.as_str()).parse(file_content)?;
    let (file_content, value) =
        preceded(parse_not_double_quote, parse_between_double_quotes).parse(file_content)?;

    Ok((file_content, value.to_string()))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(r#""appid"		"440""#, "appid", "440")]
    #[test_case(r#"  "path": "/mnt/games","#, "path", "/mnt/games"; "json")]
    #[test_case(r#""LauncherPath" "x" "name"	"Team Fortress 2""#, "name", "Team Fortress 2"; "skips other keys")]
    #[test_case(r#""installdir"		"""#, "installdir", ""; "empty value")]
    fn test_parse_value_json(input: &str, key: &str, expected: &str) {
        assert_eq!(
            parse_value_json(input, key).map(|(_, v)| v),
            Ok(expected.to_string())
        );
    }

    #[test]
    fn test_parse_value_json_missing_key() {
        assert!(parse_value_json(r#""appid" "440""#, "name").is_err());
    }

    #[test]
    fn test_parse_value_json_sequential() {
        let content = "\"appid\"\t\"10\"\n\"name\"\t\"Counter-Strike\"\n\"installdir\"\t\"Half-Life\"";

        let (content, app_id) = parse_value_json(content, "appid").expect("appid");
        let (content, name) = parse_value_json(content, "name").expect("name");
        let (_, install_dir) = parse_value_json(content, "installdir").expect("installdir");

        assert_eq!(
            (app_id.as_str(), name.as_str(), install_dir.as_str()),
            ("10", "Counter-Strike", "Half-Life")
        );
    }
}
