// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Type-erased constructors.
//!
//! Plain closures become constructors through [`Handler`] (fallible) and
//! [`InfallibleHandler`]; both are implemented for functions of up to eight
//! [`FromParam`] arguments. Hand-written constructors implement [`Construct`]
//! directly and describe themselves with a [`Signature`].

use std::any::{type_name, Any};
use std::marker::PhantomData;

use super::signature::{Param, ReturnShape, Signature};
use crate::core::{BoxError, CodecError};
use crate::decode::{Arguments, FromParam, Produced};

/// Why a construction attempt failed.
#[derive(Debug)]
pub enum ConstructError {
    /// An argument could not be converted to its declared type
    Bind(CodecError),
    /// The constructor returned an error
    Invoke(BoxError),
}

impl From<CodecError> for ConstructError {
    fn from(err: CodecError) -> Self {
        ConstructError::Bind(err)
    }
}

/// A registered constructor.
pub trait Construct: Send + Sync + 'static {
    /// Describe parameters and produced type.
    fn signature(&self) -> Signature;

    /// Run the constructor.
    ///
    /// `Ok(None)` means the constructor produced neither a value nor an
    /// error, which dispatch reports as a contract violation.
    fn construct(&self, args: Arguments) -> std::result::Result<Option<Produced>, ConstructError>;
}

/// A fallible constructor function: `Fn(A1, .., An) -> Result<T, E>`.
pub trait Handler<Args>: Send + Sync + 'static {
    /// Produced type.
    type Output: Any;

    /// Describe the handler.
    fn signature() -> Signature;

    /// Take arguments and call the function.
    fn call(&self, args: Arguments) -> std::result::Result<Self::Output, ConstructError>;
}

/// An infallible constructor function: `Fn(A1, .., An) -> T`.
pub trait InfallibleHandler<Args>: Send + Sync + 'static {
    /// Produced type.
    type Output: Any;

    /// Describe the handler.
    fn signature() -> Signature;

    /// Take arguments and call the function.
    fn call(&self, args: Arguments) -> std::result::Result<Self::Output, ConstructError>;
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        impl<Func, Out, Err, $($ty,)*> Handler<($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) -> std::result::Result<Out, Err> + Send + Sync + 'static,
            Out: Any,
            Err: Into<BoxError>,
            $($ty: FromParam,)*
        {
            type Output = Out;

            fn signature() -> Signature {
                Signature {
                    params: vec![$(Param::of::<$ty>()),*],
                    produces: type_name::<Out>(),
                    returns: ReturnShape::ValueOrError {
                        error: type_name::<Err>(),
                    },
                }
            }

            #[allow(non_snake_case, unused_variables, unused_mut)]
            fn call(&self, mut args: Arguments) -> std::result::Result<Out, ConstructError> {
                $(let $ty = args.next::<$ty>()?;)*
                (self)($($ty),*).map_err(|e| ConstructError::Invoke(e.into()))
            }
        }

        impl<Func, Out, $($ty,)*> InfallibleHandler<($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) -> Out + Send + Sync + 'static,
            Out: Any,
            $($ty: FromParam,)*
        {
            type Output = Out;

            fn signature() -> Signature {
                Signature {
                    params: vec![$(Param::of::<$ty>()),*],
                    produces: type_name::<Out>(),
                    returns: ReturnShape::Value,
                }
            }

            #[allow(non_snake_case, unused_variables, unused_mut)]
            fn call(&self, mut args: Arguments) -> std::result::Result<Out, ConstructError> {
                $(let $ty = args.next::<$ty>()?;)*
                Ok((self)($($ty),*))
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);
impl_handler!(A1, A2, A3, A4, A5);
impl_handler!(A1, A2, A3, A4, A5, A6);
impl_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_handler!(A1, A2, A3, A4, A5, A6, A7, A8);

/// A fallible function wrapped as a [`Construct`].
pub struct FnConstructor<F, Args> {
    func: F,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> FnConstructor<F, Args> {
    /// Wrap a handler.
    pub fn new(func: F) -> Self {
        Self {
            func,
            _args: PhantomData,
        }
    }
}

impl<F, Args> Construct for FnConstructor<F, Args>
where
    F: Handler<Args>,
    Args: 'static,
{
    fn signature(&self) -> Signature {
        F::signature()
    }

    fn construct(&self, args: Arguments) -> std::result::Result<Option<Produced>, ConstructError> {
        self.func.call(args).map(|value| Some(Produced::new(value)))
    }
}

/// An infallible function wrapped as a [`Construct`].
pub struct InfallibleFn<F, Args> {
    func: F,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> InfallibleFn<F, Args> {
    /// Wrap a handler.
    pub fn new(func: F) -> Self {
        Self {
            func,
            _args: PhantomData,
        }
    }
}

impl<F, Args> Construct for InfallibleFn<F, Args>
where
    F: InfallibleHandler<Args>,
    Args: 'static,
{
    fn signature(&self) -> Signature {
        F::signature()
    }

    fn construct(&self, args: Arguments) -> std::result::Result<Option<Produced>, ConstructError> {
        self.func.call(args).map(|value| Some(Produced::new(value)))
    }
}

/// Check a hand-written signature for internal consistency.
pub(crate) fn check_signature(signature: &Signature) -> std::result::Result<(), String> {
    signature.validate()?;
    if let ReturnShape::ValueOrError { error } = signature.returns {
        if error.is_empty() {
            return Err("fallible constructor declares no error type".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Arg;

    fn fallible_sig<Args, H: Handler<Args>>(_: &H) -> Signature {
        H::signature()
    }

    fn infallible_sig<Args, H: InfallibleHandler<Args>>(_: &H) -> Signature {
        H::signature()
    }

    #[test]
    fn test_handler_signature() {
        let ctor = |name: String, raw: Vec<u8>| -> std::result::Result<usize, std::io::Error> {
            Ok(name.len() + raw.len())
        };
        let sig = fallible_sig(&ctor);
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.produces, "usize");
        assert!(sig.is_fallible());
        assert!(sig.to_string().contains("-> Result<usize, "));

        let sig = infallible_sig(&|| 5u8);
        assert!(sig.params.is_empty());
        assert_eq!(sig.to_string(), "fn() -> u8");
    }

    #[test]
    fn test_fn_constructor_call() {
        let ctor = FnConstructor::new(|name: String| -> std::result::Result<String, BoxError> {
            Ok(format!("built {name}"))
        });
        let args = Arguments::new("hello", vec![Arg::Kind("hello".to_string())]);
        let produced = ctor.construct(args).unwrap().unwrap();
        assert_eq!(produced.downcast::<String>().unwrap(), "built hello");
    }

    #[test]
    fn test_fn_constructor_error() {
        let ctor = FnConstructor::new(|| -> std::result::Result<u8, String> {
            Err("nope".to_string())
        });
        match ctor.construct(Arguments::new("k", Vec::new())) {
            Err(ConstructError::Invoke(err)) => assert_eq!(err.to_string(), "nope"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bind_error_from_wrong_argument() {
        let ctor = InfallibleFn::new(|raw: Vec<u8>| raw.len());
        let args = Arguments::new("k", vec![Arg::Kind("k".to_string())]);
        assert!(matches!(
            ctor.construct(args),
            Err(ConstructError::Bind(CodecError::ParameterResolution { .. }))
        ));
    }

    #[test]
    fn test_check_signature() {
        let sig = Signature {
            params: Vec::new(),
            produces: "u8",
            returns: ReturnShape::ValueOrError { error: "" },
        };
        assert!(check_signature(&sig).unwrap_err().contains("no error type"));
    }
}
