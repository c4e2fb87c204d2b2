use super::{first_text, CompiledSelectors, ExtractError, MetadataField};
use crate::token::TokenMetadata;
use crate::url::RouteTable;
use scraper::Html;
use url::Url;

/// Extracts token metadata from a detail page
///
/// # Returns
///
/// * `Ok(Some(TokenMetadata))` - every field was found
/// * `Ok(None)` - the URL is not a detail page according to `routes`
/// * `Err(ExtractError)` - the first field (name, symbol, contract address)
///   that could not be located
pub fn extract_metadata(
    document: &Html,
    url: &Url,
    routes: &RouteTable,
    selectors: &CompiledSelectors,
) -> Result<Option<TokenMetadata>, ExtractError> {
    if !routes.is_detail_page(url) {
        return Ok(None);
    }

    let missing = |field| ExtractError {
        field,
        url: url.to_string(),
    };

    let name = first_text(document, &selectors.name).ok_or_else(|| missing(MetadataField::Name))?;

    let symbol = first_text(document, &selectors.supply)
        .as_deref()
        .and_then(parse_symbol)
        .ok_or_else(|| missing(MetadataField::Symbol))?;

    let contract_address = first_text(document, &selectors.contract)
        .ok_or_else(|| missing(MetadataField::ContractAddress))?;

    Ok(Some(TokenMetadata::new(name, symbol, contract_address)))
}

/// Takes the symbol out of the supply text
///
/// The summary row reads `<total supply> <SYMBOL>`; the text is split on single
/// spaces and the second token is the symbol.
///
/// # Examples
///
/// ```
/// use token_sifter::extract::parse_symbol;
///
/// assert_eq!(parse_symbol("1,000,000 ABC"), Some("ABC".to_string()));
/// assert_eq!(parse_symbol("1,000,000"), None);
/// ```
pub fn parse_symbol(supply: &str) -> Option<String> {
    supply
        .split(' ')
        .nth(1)
        .filter(|symbol| !symbol.is_empty())
        .map(str::to_string)
}
