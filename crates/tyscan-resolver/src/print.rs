//! Canonical type printing.
//!
//! Renders a raw descriptor as a canonical string with package paths in
//! place of package aliases. Used for the `structure` field of functions
//! and methods and for display names of instantiations; two structurally
//! equal shapes always print identically.

use tyscan_front::{ChanDir, TypeDesc, Ty, TypeTable};

/// Canonical printer over one descriptor table.
pub struct TypePrinter<'a> {
    table: &'a TypeTable,
}

impl<'a> TypePrinter<'a> {
    pub fn new(table: &'a TypeTable) -> Self {
        TypePrinter { table }
    }

    /// Canonical form of a type.
    pub fn print(&self, ty: Ty) -> String {
        self.print_depth(ty, 0)
    }

    fn print_depth(&self, ty: Ty, depth: usize) -> String {
        // Self-referential shapes can only recur through a named node,
        // which prints as its id without descending, so the only way to
        // run deep here is a degenerate descriptor chain.
        if depth > 64 {
            return "...".to_string();
        }
        let Some(desc) = self.table.get(ty) else {
            return "<invalid>".to_string();
        };
        match desc {
            TypeDesc::Basic(kind) => kind.name().to_string(),
            TypeDesc::Named(named) => {
                let base = if named.pkg.is_empty() {
                    named.name.clone()
                } else {
                    format!("{}.{}", named.pkg, named.name)
                };
                if named.type_args.is_empty() {
                    base
                } else {
                    let args: Vec<String> = named
                        .type_args
                        .iter()
                        .map(|a| self.print_depth(*a, depth + 1))
                        .collect();
                    format!("{}[{}]", base, args.join(", "))
                }
            }
            TypeDesc::Alias { pkg, name, .. } => {
                if pkg.is_empty() {
                    name.clone()
                } else {
                    format!("{pkg}.{name}")
                }
            }
            TypeDesc::Pointer { elem } => format!("*{}", self.print_depth(*elem, depth + 1)),
            TypeDesc::Slice { elem } => format!("[]{}", self.print_depth(*elem, depth + 1)),
            TypeDesc::Array { elem, len } => {
                format!("[{}]{}", len, self.print_depth(*elem, depth + 1))
            }
            TypeDesc::Map { key, value } => format!(
                "map[{}]{}",
                self.print_depth(*key, depth + 1),
                self.print_depth(*value, depth + 1)
            ),
            TypeDesc::Chan { elem, dir } => {
                let elem = self.print_depth(*elem, depth + 1);
                match dir {
                    ChanDir::Both => format!("chan {elem}"),
                    ChanDir::Send => format!("chan<- {elem}"),
                    ChanDir::Recv => format!("<-chan {elem}"),
                }
            }
            TypeDesc::Struct { fields } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        if f.embedded {
                            self.print_depth(f.ty, depth + 1)
                        } else {
                            format!("{} {}", f.name, self.print_depth(f.ty, depth + 1))
                        }
                    })
                    .collect();
                format!("struct{{{}}}", fields.join("; "))
            }
            TypeDesc::Interface { embeds, methods } => {
                let mut parts: Vec<String> =
                    embeds.iter().map(|e| self.print_depth(*e, depth + 1)).collect();
                parts.extend(methods.iter().map(|m| {
                    format!("{}{}", m.name, self.signature_suffix(m.sig, depth + 1))
                }));
                format!("interface{{{}}}", parts.join("; "))
            }
            TypeDesc::Signature { .. } => format!("func{}", self.signature_suffix(ty, depth)),
            TypeDesc::TypeParam { name, .. } => name.clone(),
            TypeDesc::Union { terms } => {
                let terms: Vec<String> = terms
                    .iter()
                    .map(|t| {
                        let printed = self.print_depth(t.ty, depth + 1);
                        if t.approx {
                            format!("~{printed}")
                        } else {
                            printed
                        }
                    })
                    .collect();
                terms.join(" | ")
            }
        }
    }

    /// The `(params) (results)` suffix of a signature, without the
    /// leading `func` or method name.
    pub fn signature_suffix(&self, sig: Ty, depth: usize) -> String {
        let Some(TypeDesc::Signature {
            params, results, ..
        }) = self.table.get(sig)
        else {
            return "(<invalid>)".to_string();
        };
        let params: Vec<String> = params
            .iter()
            .map(|p| {
                let ty = self.print_depth(p.ty, depth + 1);
                let ty = if p.variadic { format!("...{ty}") } else { ty };
                if p.name.is_empty() {
                    ty
                } else {
                    format!("{} {}", p.name, ty)
                }
            })
            .collect();
        let rendered_params = format!("({})", params.join(", "));
        let results: Vec<String> = results
            .iter()
            .map(|r| {
                let ty = self.print_depth(r.ty, depth + 1);
                if r.name.is_empty() {
                    ty
                } else {
                    format!("{} {}", r.name, ty)
                }
            })
            .collect();
        match results.len() {
            0 => rendered_params,
            1 if !results[0].contains(' ') => format!("{} {}", rendered_params, results[0]),
            _ => format!("{} ({})", rendered_params, results.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyscan_front::{BasicKind, FieldDesc, ParamDesc, UnionTermDesc};

    #[test]
    fn test_print_composites() {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        let string = table.basic(BasicKind::String);
        let named = table.named("example.com/pkg", "T", int);
        let ptr = table.pointer(named);
        let ptr2 = table.pointer(ptr);
        let slice = table.slice(string);
        let arr = table.array(named, 5);
        let m = table.map(string, ptr);
        let send = table.chan(int, ChanDir::Send);

        let printer = TypePrinter::new(&table);
        assert_eq!(printer.print(ptr2), "**example.com/pkg.T");
        assert_eq!(printer.print(slice), "[]string");
        assert_eq!(printer.print(arr), "[5]example.com/pkg.T");
        assert_eq!(printer.print(m), "map[string]*example.com/pkg.T");
        assert_eq!(printer.print(send), "chan<- int");
    }

    #[test]
    fn test_print_signature_and_struct() {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        let string = table.basic(BasicKind::String);
        let err = table.basic(BasicKind::Error);
        let sig = table.signature(
            vec![ParamDesc::new("n", int), ParamDesc::variadic("rest", string)],
            vec![ParamDesc::new("", string), ParamDesc::new("", err)],
        );
        let st = table.strukt(vec![FieldDesc::new("N", int)]);

        let printer = TypePrinter::new(&table);
        assert_eq!(printer.print(sig), "func(n int, rest ...string) (string, error)");
        assert_eq!(printer.print(st), "struct{N int}");
    }

    #[test]
    fn test_print_union_terms() {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        let f64t = table.basic(BasicKind::Float64);
        let union = table.union(vec![
            UnionTermDesc { ty: int, approx: true },
            UnionTermDesc { ty: f64t, approx: true },
        ]);
        let printer = TypePrinter::new(&table);
        assert_eq!(printer.print(union), "~int | ~float64");
    }
}
